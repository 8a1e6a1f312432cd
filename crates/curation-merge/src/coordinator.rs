//! Per-document merge coordination
//!
//! Merging mutates a curator graph and is single-threaded per document.
//! The coordinator serialises merges of the same document behind its lock
//! while merges of different documents run in parallel.

use crate::error::ReconcileError;
use crate::reconciler::Reconciler;
use crate::report::MergeReport;
use curation_diff::AnnotatorId;
use curation_graph::AnnotationGraph;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;

/// Coordinator statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoordinatorStats {
    /// Documents currently registered
    pub documents: usize,
    /// Reconciliations completed
    pub reconciliations: usize,
    /// Reconciliations rejected with a fatal error
    pub failures: usize,
}

/// Registry of curator graphs keyed by document id
#[derive(Debug, Default)]
pub struct MergeCoordinator {
    documents: DashMap<String, Arc<Mutex<AnnotationGraph>>>,
    stats: Mutex<CoordinatorStats>,
}

impl MergeCoordinator {
    /// Create empty coordinator
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the curator graph of a document
    ///
    /// Returns the previously registered graph, if any.
    pub fn register(&self, document: impl Into<String>, curator: AnnotationGraph) -> Option<AnnotationGraph> {
        let document = document.into();
        tracing::debug!(document = %document, nodes = curator.len(), "curator graph registered");
        let previous = self
            .documents
            .insert(document, Arc::new(Mutex::new(curator)))
            .map(|old| old.lock().clone());
        self.stats.lock().documents = self.documents.len();
        previous
    }

    /// Diff `graphs` against the document's curator graph and reconcile
    ///
    /// Holds the document lock for the whole pass.
    ///
    /// # Errors
    /// `UnknownDocument` when the document is not registered; see also
    /// [`Reconciler::run`]
    pub fn reconcile_document<'g, S, I>(
        &self,
        document: &str,
        reconciler: &Reconciler<'_>,
        entry_types: &[S],
        graphs: I,
    ) -> Result<MergeReport, ReconcileError>
    where
        S: AsRef<str>,
        I: IntoIterator<Item = (AnnotatorId, &'g AnnotationGraph)>,
    {
        let curator = self.handle(document)?;
        let result = {
            let mut guard = curator.lock();
            reconciler.run(entry_types, &mut *guard, graphs)
        };

        let mut stats = self.stats.lock();
        match &result {
            Ok(_) => stats.reconciliations += 1,
            Err(error) => {
                stats.failures += 1;
                tracing::warn!(document, %error, "reconciliation rejected");
            }
        }
        result
    }

    /// Copy of the document's curator graph
    #[must_use]
    pub fn curator_snapshot(&self, document: &str) -> Option<AnnotationGraph> {
        let curator = self.documents.get(document).map(|e| Arc::clone(e.value()))?;
        let snapshot = curator.lock().clone();
        Some(snapshot)
    }

    /// Run `f` with exclusive access to the document's curator graph
    ///
    /// # Errors
    /// `UnknownDocument` when the document is not registered
    pub fn with_curator<R>(
        &self,
        document: &str,
        f: impl FnOnce(&mut AnnotationGraph) -> R,
    ) -> Result<R, ReconcileError> {
        let curator = self.handle(document)?;
        let mut guard = curator.lock();
        Ok(f(&mut *guard))
    }

    /// Unregister a document, returning its curator graph
    pub fn forget(&self, document: &str) -> Option<AnnotationGraph> {
        let (_, curator) = self.documents.remove(document)?;
        self.stats.lock().documents = self.documents.len();
        let graph = curator.lock().clone();
        Some(graph)
    }

    /// Registered document ids, sorted
    #[must_use]
    pub fn active_documents(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.documents.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Current statistics
    #[must_use]
    pub fn stats(&self) -> CoordinatorStats {
        *self.stats.lock()
    }

    fn handle(&self, document: &str) -> Result<Arc<Mutex<AnnotationGraph>>, ReconcileError> {
        self.documents
            .get(document)
            .map(|e| Arc::clone(e.value()))
            .ok_or_else(|| ReconcileError::UnknownDocument(document.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MergeOptions;
    use curation_test_utils as fx;
    use std::thread;

    #[test]
    fn unknown_document_is_rejected() {
        let coordinator = MergeCoordinator::new();
        let policies = fx::standard_policies();
        let reconciler = Reconciler::new(&policies, MergeOptions::default());
        let err = coordinator
            .reconcile_document(
                "missing",
                &reconciler,
                &[fx::POS],
                Vec::<(AnnotatorId, &AnnotationGraph)>::new(),
            )
            .unwrap_err();
        assert_eq!(err, ReconcileError::UnknownDocument("missing".into()));
        assert_eq!(coordinator.stats().failures, 0);
    }

    #[test]
    fn register_and_forget() {
        let coordinator = MergeCoordinator::new();
        let (curator, _) = fx::tokenized();
        assert!(coordinator.register("doc-1", curator).is_none());
        assert_eq!(coordinator.active_documents(), vec!["doc-1".to_string()]);
        assert_eq!(coordinator.stats().documents, 1);

        let graph = coordinator.forget("doc-1").unwrap();
        assert_eq!(graph.len(), fx::TOKENS.len());
        assert!(coordinator.active_documents().is_empty());
        assert!(coordinator.curator_snapshot("doc-1").is_none());
    }

    #[test]
    fn parallel_documents_and_serialised_repeats() {
        let coordinator = MergeCoordinator::new();
        let scenarios: Vec<(String, fx::Scenario)> = (0..4)
            .map(|i| (format!("doc-{i}"), fx::agreeing_pos()))
            .collect();
        for (doc, scenario) in &scenarios {
            coordinator.register(doc.clone(), scenario.curator.clone());
        }

        thread::scope(|s| {
            for (doc, scenario) in &scenarios {
                for _ in 0..2 {
                    let coordinator = &coordinator;
                    s.spawn(move || {
                        let reconciler = Reconciler::new(&scenario.policies, MergeOptions::default());
                        let graphs = scenario
                            .annotators
                            .iter()
                            .map(|(name, g)| (AnnotatorId::from(name.as_str()), g));
                        coordinator
                            .reconcile_document(doc, &reconciler, &[fx::POS], graphs)
                            .unwrap();
                    });
                }
            }
        });

        assert_eq!(coordinator.stats().reconciliations, 8);
        for (doc, _) in &scenarios {
            let curator = coordinator.curator_snapshot(doc).unwrap();
            assert_eq!(curator.select_at(fx::POS, 0, 4).len(), 1);
        }
    }
}
