//! Diff engine
//!
//! Aligns the items of several annotation graphs by [`Position`] and
//! partitions each position's items into configurations.

use crate::annotator::AnnotatorId;
use crate::configuration::{ConfigurationItem, ConfigurationSet, SlotRef};
use crate::error::DiffError;
use crate::fingerprint::Fingerprint;
use crate::result::DiffResult;
use curation_graph::{AnnotationGraph, GraphId};
use curation_position::{IndexError, PolicyTable, Position, PositionIndexer};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, info_span};

/// Diff engine options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffOptions {
    /// Index graphs and partition positions on the rayon pool
    pub parallel: bool,

    /// Types to diff; empty means every type with a policy
    pub entry_types: Vec<String>,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            entry_types: Vec::new(),
        }
    }
}

impl DiffOptions {
    /// Set parallelism
    #[inline]
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Set entry types
    #[inline]
    #[must_use]
    pub fn with_entry_types<S: Into<String>>(mut self, types: impl IntoIterator<Item = S>) -> Self {
        self.entry_types = types.into_iter().map(Into::into).collect();
        self
    }

    /// Entry types to use with `policies`
    #[must_use]
    pub fn resolve_entry_types(&self, policies: &PolicyTable) -> Vec<String> {
        if self.entry_types.is_empty() {
            policies.type_names()
        } else {
            self.entry_types.clone()
        }
    }
}

/// One observation before grouping
#[derive(Debug)]
struct Observation {
    position: Position,
    fingerprint: Fingerprint,
    item: ConfigurationItem,
}

/// Computes diffs under a policy table
#[derive(Debug, Clone)]
pub struct DiffEngine<'p> {
    policies: &'p PolicyTable,
    options: DiffOptions,
}

impl<'p> DiffEngine<'p> {
    /// Create engine with default options
    #[inline]
    #[must_use]
    pub fn new(policies: &'p PolicyTable) -> Self {
        Self {
            policies,
            options: DiffOptions::default(),
        }
    }

    /// Set options
    #[inline]
    #[must_use]
    pub fn with_options(mut self, options: DiffOptions) -> Self {
        self.options = options;
        self
    }

    /// Options in use
    #[inline]
    #[must_use]
    pub fn options(&self) -> &DiffOptions {
        &self.options
    }

    /// Diff `graphs` over `entry_types`
    ///
    /// Every annotator except [`AnnotatorId::curator`] becomes a considered
    /// annotator of the result. Loose-end relations are skipped.
    ///
    /// # Errors
    /// `UnknownEntryType` for an entry type without policy,
    /// `DuplicateAnnotator` when an annotator appears twice, and `Malformed`
    /// when a graph is structurally malformed
    pub fn compute<'g, S, I>(&self, entry_types: &[S], graphs: I) -> Result<DiffResult, DiffError>
    where
        S: AsRef<str>,
        I: IntoIterator<Item = (AnnotatorId, &'g AnnotationGraph)>,
    {
        let mut types: Vec<String> = Vec::with_capacity(entry_types.len());
        for t in entry_types {
            let t = t.as_ref();
            if !self.policies.contains(t) {
                return Err(DiffError::UnknownEntryType(t.to_string()));
            }
            if !types.iter().any(|seen| seen == t) {
                types.push(t.to_string());
            }
        }

        let mut sources: Vec<(AnnotatorId, &AnnotationGraph)> = graphs.into_iter().collect();
        sources.sort_by(|a, b| a.0.cmp(&b.0));
        if let Some(pair) = sources.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(DiffError::DuplicateAnnotator(pair[0].0.clone()));
        }

        let span = info_span!("diff", graphs = sources.len(), types = types.len());
        let _guard = span.enter();

        let observed: Vec<Vec<Observation>> = if self.options.parallel {
            sources
                .par_iter()
                .map(|(annotator, graph)| self.observe(annotator, graph, &types))
                .collect::<Result<_, _>>()?
        } else {
            sources
                .iter()
                .map(|(annotator, graph)| self.observe(annotator, graph, &types))
                .collect::<Result<_, _>>()?
        };

        let mut buckets: BTreeMap<Position, Vec<(Fingerprint, ConfigurationItem)>> = BTreeMap::new();
        for obs in observed.into_iter().flatten() {
            buckets
                .entry(obs.position)
                .or_default()
                .push((obs.fingerprint, obs.item));
        }

        let sets: BTreeMap<Position, ConfigurationSet> = if self.options.parallel {
            buckets.into_par_iter().map(partition).collect()
        } else {
            buckets.into_iter().map(partition).collect()
        };

        let annotators: BTreeSet<AnnotatorId> = sources
            .iter()
            .map(|(a, _)| a.clone())
            .filter(|a| !a.is_curator())
            .collect();
        let graphs: BTreeMap<AnnotatorId, GraphId> =
            sources.iter().map(|(a, g)| (a.clone(), g.id())).collect();

        info!(
            positions = sets.len(),
            annotators = annotators.len(),
            "diff computed"
        );
        Ok(DiffResult::new(sets, annotators, types, graphs))
    }

    fn observe(
        &self,
        annotator: &AnnotatorId,
        graph: &AnnotationGraph,
        types: &[String],
    ) -> Result<Vec<Observation>, DiffError> {
        let indexer = PositionIndexer::new(self.policies);
        let malformed = |source: IndexError| DiffError::Malformed {
            annotator: annotator.clone(),
            source,
        };

        let mut out = Vec::new();
        for type_name in types {
            let policy = self.policies.require(type_name).map_err(malformed)?;
            for node in graph.nodes_of_type(type_name) {
                let Some(position) = indexer.position_of_node(graph, node).map_err(malformed)? else {
                    continue;
                };
                out.push(Observation {
                    position,
                    fingerprint: Fingerprint::of_node(&indexer, graph, node, policy, annotator),
                    item: ConfigurationItem::node(annotator.clone(), node.handle()),
                });

                for slot in indexer
                    .slot_positions(graph, node.handle())
                    .map_err(malformed)?
                {
                    out.push(Observation {
                        position: slot.position,
                        fingerprint: Fingerprint::Slot(slot.value),
                        item: ConfigurationItem::slot(
                            annotator.clone(),
                            node.handle(),
                            SlotRef {
                                feature: slot.feature,
                                index: slot.index,
                                target: slot.target,
                            },
                        ),
                    });
                }
            }
        }

        debug!(annotator = %annotator, items = out.len(), "graph indexed");
        Ok(out)
    }
}

fn partition(
    (position, items): (Position, Vec<(Fingerprint, ConfigurationItem)>),
) -> (Position, ConfigurationSet) {
    let mut set = ConfigurationSet::new(position.clone());
    for (fingerprint, item) in items {
        set.add(fingerprint, item);
    }
    (position, set)
}

/// Diff `graphs` over `entry_types` with default options
///
/// # Errors
/// See [`DiffEngine::compute`]
pub fn compute_diff<'g, S, I>(
    entry_types: &[S],
    policies: &PolicyTable,
    graphs: I,
) -> Result<DiffResult, DiffError>
where
    S: AsRef<str>,
    I: IntoIterator<Item = (AnnotatorId, &'g AnnotationGraph)>,
{
    DiffEngine::new(policies).compute(entry_types, graphs)
}
