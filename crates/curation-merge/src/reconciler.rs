//! Merge reconciler
//!
//! Walks a [`DiffResult`] in position order and populates the curator graph:
//! spans first, then relations (whose endpoints must already be merged),
//! then link arrays element by element. Inputs are validated up front so a
//! fatal error never leaves the curator graph half-mutated.

use crate::config::MergeOptions;
use crate::error::{Endpoint, MergeError, ReconcileError};
use crate::report::{MergeReport, Outcome};
use crate::single::Displacement;
use curation_diff::{
    Agreement, AnnotatorId, ConfigurationItem, ConfigurationSet, DiffEngine, DiffOptions,
    DiffResult,
};
use curation_graph::{AnnotationGraph, GraphError, Link, NodeHandle, Value};
use curation_position::{LayerPolicy, PolicyTable, Position, PositionIndexer};
use std::collections::{BTreeMap, BTreeSet};
use std::iter;
use tracing::{debug, info, info_span};

/// Annotator graphs by id
pub(crate) type Sources<'g> = BTreeMap<AnnotatorId, &'g AnnotationGraph>;

/// Link element filler as seen from the curator graph
enum Filler {
    /// Element to keep, with its ordering key
    Resolved((usize, usize), Link),
    /// Filler position was not merged
    NotMerged(Agreement),
}

/// Populates a curator graph from diffs
#[derive(Debug, Clone)]
pub struct Reconciler<'p> {
    pub(crate) policies: &'p PolicyTable,
    pub(crate) options: MergeOptions,
    diff_options: DiffOptions,
}

impl<'p> Reconciler<'p> {
    /// Create reconciler
    #[inline]
    #[must_use]
    pub fn new(policies: &'p PolicyTable, options: MergeOptions) -> Self {
        Self {
            policies,
            options,
            diff_options: DiffOptions::default(),
        }
    }

    /// Set options used by [`Reconciler::run`] to compute the diff
    #[inline]
    #[must_use]
    pub fn with_diff_options(mut self, diff_options: DiffOptions) -> Self {
        self.diff_options = diff_options;
        self
    }

    /// Merge options in use
    #[inline]
    #[must_use]
    pub fn options(&self) -> MergeOptions {
        self.options
    }

    /// Policy table in use
    #[inline]
    #[must_use]
    pub fn policies(&self) -> &'p PolicyTable {
        self.policies
    }

    #[inline]
    pub(crate) fn indexer(&self) -> PositionIndexer<'p> {
        PositionIndexer::new(self.policies)
    }

    pub(crate) fn policy(&self, type_name: &str) -> Result<&'p LayerPolicy, MergeError> {
        self.policies
            .get(type_name)
            .ok_or_else(|| MergeError::UnknownLayer(type_name.to_string()))
    }

    /// Diff `graphs` plus the curator graph, then reconcile
    ///
    /// # Errors
    /// See [`Reconciler::reconcile`]; diff failures surface as
    /// `ReconcileError::Diff`
    pub fn run<'g, S, I>(
        &self,
        entry_types: &[S],
        curator: &mut AnnotationGraph,
        graphs: I,
    ) -> Result<MergeReport, ReconcileError>
    where
        S: AsRef<str>,
        I: IntoIterator<Item = (AnnotatorId, &'g AnnotationGraph)>,
    {
        let sources: Vec<(AnnotatorId, &AnnotationGraph)> = graphs.into_iter().collect();
        let diff = DiffEngine::new(self.policies)
            .with_options(self.diff_options.clone())
            .compute(
                entry_types,
                sources
                    .iter()
                    .cloned()
                    .chain(iter::once((AnnotatorId::curator(), &*curator))),
            )?;
        self.reconcile(&diff, curator, sources)
    }

    /// Reconcile `curator` against a diff of `graphs`
    ///
    /// # Errors
    /// `Malformed` when the inputs do not match the diff (missing or
    /// replaced graphs, stale handles, entry types without policy). No
    /// mutation happens in that case. Per-position problems are recorded in
    /// the report instead.
    pub fn reconcile<'g, I>(
        &self,
        diff: &DiffResult,
        curator: &mut AnnotationGraph,
        graphs: I,
    ) -> Result<MergeReport, ReconcileError>
    where
        I: IntoIterator<Item = (AnnotatorId, &'g AnnotationGraph)>,
    {
        let mut sources: Sources<'g> = BTreeMap::new();
        for (annotator, graph) in graphs {
            if let Some(previous) = sources.insert(annotator.clone(), graph) {
                if previous.id() != graph.id() {
                    return Err(ReconcileError::Malformed(format!(
                        "two graphs supplied for annotator {annotator}"
                    )));
                }
            }
        }
        self.validate(diff, curator, &sources)?;

        let span = info_span!(
            "reconcile",
            positions = diff.len(),
            bootstrap = self.options.bootstrap,
            merge_incomplete = self.options.merge_incomplete
        );
        let _guard = span.enter();

        let mut report = MergeReport::new();
        let mut detached = Vec::new();
        let mut displaced: Vec<(Position, Position)> = Vec::new();

        if self.options.bootstrap {
            report.bootstrap_removed = curator.clear_types(diff.entry_types());
            debug!(removed = report.bootstrap_removed, "bootstrap cleared curator");
        }

        let mut spans = Vec::new();
        let mut relations = Vec::new();
        let mut slots: BTreeMap<Position, Vec<&ConfigurationSet>> = BTreeMap::new();
        for set in diff.iter() {
            if set.is_slot() {
                slots.entry(set.position().host()).or_default().push(set);
            } else if set.position().is_relation() {
                relations.push(set);
            } else {
                spans.push(set);
            }
        }

        // Endpoints first: a relation over a relation may sort before it.
        relations.sort_by_key(|set| set.position().depth());
        for set in spans.into_iter().chain(relations) {
            self.merge_position(diff, set, curator, &sources, &mut report, &mut detached, &mut displaced);
        }
        for (position, by) in &displaced {
            let agreement = diff.agreement_at(position).unwrap_or(Agreement::Incomplete);
            report.displace(position, agreement, by);
        }
        for (host, sets) in &slots {
            self.merge_links(diff, host, sets, curator, &sources, &mut report);
        }
        report.loose_relations_removed = self.remove_loose_relations(curator, detached);

        let totals = report.totals();
        info!(
            merged = totals.merged,
            unchanged = totals.unchanged,
            skipped = totals.skipped_incomplete + totals.skipped_disagreement,
            errored = totals.errored,
            removed = totals.removed,
            "reconcile finished"
        );
        Ok(report)
    }

    fn validate(
        &self,
        diff: &DiffResult,
        curator: &AnnotationGraph,
        sources: &Sources<'_>,
    ) -> Result<(), ReconcileError> {
        for entry_type in diff.entry_types() {
            self.policies.require(entry_type)?;
        }

        if sources.keys().any(AnnotatorId::is_curator) {
            return Err(ReconcileError::Malformed(
                "the curator graph must not be supplied as an annotator graph".into(),
            ));
        }

        for (annotator, graph_id) in diff.sources() {
            if annotator.is_curator() {
                if graph_id != curator.id() {
                    return Err(ReconcileError::Malformed(format!(
                        "diff was computed against curator graph {graph_id}, not {}",
                        curator.id()
                    )));
                }
                continue;
            }
            match sources.get(annotator) {
                None => {
                    return Err(ReconcileError::Malformed(format!(
                        "no graph supplied for annotator {annotator}"
                    )))
                }
                Some(graph) if graph.id() != graph_id => {
                    return Err(ReconcileError::Malformed(format!(
                        "graph of {annotator} is not the one the diff was computed from"
                    )))
                }
                Some(_) => {}
            }
        }

        for item in diff.iter().flat_map(ConfigurationSet::items) {
            let graph = if item.annotator.is_curator() {
                curator
            } else {
                sources.get(&item.annotator).copied().ok_or_else(|| {
                    ReconcileError::Malformed(format!("no graph supplied for {}", item.annotator))
                })?
            };
            graph.check(item.node)?;
            if let Some(slot) = &item.slot {
                graph.check(slot.target)?;
            }
        }
        Ok(())
    }

    /// First item of a considered, non-curator annotator
    fn source_item<'d>(diff: &DiffResult, set: &'d ConfigurationSet) -> Option<&'d ConfigurationItem> {
        set.items()
            .find(|i| !i.annotator.is_curator() && diff.annotators().contains(&i.annotator))
    }

    #[allow(clippy::too_many_arguments)]
    fn merge_position(
        &self,
        diff: &DiffResult,
        set: &ConfigurationSet,
        curator: &mut AnnotationGraph,
        sources: &Sources<'_>,
        report: &mut MergeReport,
        detached: &mut Vec<NodeHandle>,
        displaced: &mut Vec<(Position, Position)>,
    ) {
        let position = set.position();
        let agreement = diff.classify(set);

        let Some(item) = Self::source_item(diff, set) else {
            if !self.options.bootstrap {
                report.record(position, agreement, Outcome::Preserved);
            }
            return;
        };

        let outcome = if agreement.is_mergeable(self.options.merge_incomplete) {
            self.merge_agreed(position, item, curator, sources).map(|placed| match placed {
                Some(displacement) => {
                    detached.extend(displacement.detached);
                    displaced.extend(displacement.positions.into_iter().map(|p| (p, position.clone())));
                    Outcome::Merged
                }
                None => Outcome::Unchanged,
            })
        } else {
            self.remove_at(position, curator, detached)
                .map(|removed| match agreement {
                    Agreement::Incomplete => Outcome::SkippedIncomplete { removed },
                    _ => Outcome::SkippedDisagreement { removed },
                })
        };
        report.record(position, agreement, outcome.unwrap_or_else(Outcome::Errored));
    }

    /// Copy an agreed annotation unless the curator already has one there
    ///
    /// Returns `None` when the curator graph was left as is.
    fn merge_agreed(
        &self,
        position: &Position,
        item: &ConfigurationItem,
        curator: &mut AnnotationGraph,
        sources: &Sources<'_>,
    ) -> Result<Option<Displacement>, MergeError> {
        let indexer = self.indexer();
        if !indexer.nodes_at(curator, position)?.is_empty() {
            return Ok(None);
        }

        let source = source_graph(sources, item)?;
        let node = source.node(item.node)?;
        let policy = self.policy(node.type_name())?;
        let endpoints = match position.endpoints() {
            Some(ep) => Some((
                self.resolve_unique(curator, &ep.source, Endpoint::Source, position)?,
                self.resolve_unique(curator, &ep.target, Endpoint::Target, position)?,
            )),
            None => None,
        };

        let (placement, displacement) = self.place_node(source, node, policy, curator, position, endpoints)?;
        debug!(position = %position, node = %placement.handle(), "merged");
        Ok(Some(displacement))
    }

    fn remove_at(
        &self,
        position: &Position,
        curator: &mut AnnotationGraph,
        detached: &mut Vec<NodeHandle>,
    ) -> Result<usize, MergeError> {
        let doomed = self.indexer().nodes_at(curator, position)?;
        for handle in &doomed {
            let removal = curator.remove(*handle)?;
            detached.extend(removal.detached);
        }
        if !doomed.is_empty() {
            debug!(position = %position, removed = doomed.len(), "removed curator content");
        }
        Ok(doomed.len())
    }

    /// Exactly one curator node at `position`
    pub(crate) fn resolve_unique(
        &self,
        curator: &AnnotationGraph,
        position: &Position,
        endpoint: Endpoint,
        merging: &Position,
    ) -> Result<NodeHandle, MergeError> {
        let candidates = self.indexer().nodes_at(curator, position)?;
        match candidates.as_slice() {
            [one] => Ok(*one),
            [] => Err(MergeError::LooseEnds {
                position: merging.clone(),
                endpoint,
            }),
            many => Err(MergeError::AmbiguousEndpoint {
                position: merging.clone(),
                endpoint,
                candidates: many.len(),
            }),
        }
    }

    fn merge_links(
        &self,
        diff: &DiffResult,
        host: &Position,
        sets: &[&ConfigurationSet],
        curator: &mut AnnotationGraph,
        sources: &Sources<'_>,
        report: &mut MergeReport,
    ) {
        let contributed: Vec<&ConfigurationSet> = sets
            .iter()
            .copied()
            .filter(|s| Self::source_item(diff, s).is_some())
            .collect();
        if !self.options.bootstrap {
            for set in sets.iter().filter(|s| Self::source_item(diff, s).is_none()) {
                report.record(set.position(), diff.classify(set), Outcome::Preserved);
            }
        }
        if contributed.is_empty() {
            return;
        }

        let fail_all = |report: &mut MergeReport, outcome: Outcome| {
            for set in &contributed {
                report.record(set.position(), diff.classify(set), outcome.clone());
            }
        };

        let host_handle = match self.indexer().nodes_at(curator, host) {
            Ok(hosts) => match hosts.as_slice() {
                [one] => *one,
                [] => return fail_all(report, Outcome::HostNotMerged),
                many => {
                    return fail_all(
                        report,
                        Outcome::Errored(MergeError::NoUniqueHost {
                            position: host.clone(),
                            candidates: many.len(),
                        }),
                    )
                }
            },
            Err(e) => return fail_all(report, Outcome::Errored(e.into())),
        };

        let features: BTreeSet<&str> = contributed
            .iter()
            .filter_map(|s| s.position().slot().map(|k| k.feature.as_str()))
            .collect();
        for feature in features {
            let feature_sets: Vec<&ConfigurationSet> = contributed
                .iter()
                .copied()
                .filter(|s| s.position().slot().is_some_and(|k| k.feature == feature))
                .collect();
            if let Err(e) =
                self.rewrite_links(diff, host_handle, feature, &feature_sets, curator, sources, report)
            {
                for set in feature_sets {
                    report.record(set.position(), diff.classify(set), Outcome::Errored(e.clone()));
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn rewrite_links(
        &self,
        diff: &DiffResult,
        host: NodeHandle,
        feature: &str,
        sets: &[&ConfigurationSet],
        curator: &mut AnnotationGraph,
        sources: &Sources<'_>,
        report: &mut MergeReport,
    ) -> Result<(), MergeError> {
        let indexer = self.indexer();
        let current: Vec<Link> = curator.node(host)?.links(feature).to_vec();
        let existing: Vec<(Position, usize)> = indexer
            .slot_positions(curator, host)?
            .into_iter()
            .filter(|e| e.feature == feature)
            .map(|e| (e.position, e.index))
            .collect();

        let mut survivors: Vec<((usize, usize), Link)> = Vec::new();
        let mut consumed: BTreeSet<usize> = BTreeSet::new();
        let mut outcomes = Vec::with_capacity(sets.len());

        for set in sets {
            let agreement = diff.classify(set);
            let in_curator: Vec<usize> = existing
                .iter()
                .filter(|(p, _)| p == set.position())
                .map(|(_, i)| *i)
                .collect();
            consumed.extend(in_curator.iter().copied());

            let outcome = match Self::source_item(diff, set) {
                Some(item) if agreement.is_mergeable(self.options.merge_incomplete) => {
                    match self.resolve_link(diff, item, sources, curator, set.position()) {
                        Ok(Filler::Resolved(key, link)) => {
                            survivors.push((key, link));
                            if in_curator.is_empty() {
                                Outcome::Merged
                            } else {
                                Outcome::Unchanged
                            }
                        }
                        Ok(Filler::NotMerged(Agreement::Incomplete)) => Outcome::SkippedIncomplete {
                            removed: in_curator.len(),
                        },
                        Ok(Filler::NotMerged(_)) => Outcome::SkippedDisagreement {
                            removed: in_curator.len(),
                        },
                        Err(e) => Outcome::Errored(e),
                    }
                }
                _ if agreement == Agreement::Incomplete => Outcome::SkippedIncomplete {
                    removed: in_curator.len(),
                },
                _ => Outcome::SkippedDisagreement {
                    removed: in_curator.len(),
                },
            };
            outcomes.push((set.position(), agreement, outcome));
        }

        survivors.sort_by_key(|(key, _)| *key);
        let mut rewritten: Vec<Link> = survivors.into_iter().map(|(_, link)| link).collect();
        rewritten.extend(
            current
                .iter()
                .enumerate()
                .filter(|(i, _)| !consumed.contains(i))
                .map(|(_, link)| link.clone()),
        );

        if rewritten != current {
            curator.set_attribute(host, feature, Value::Links(rewritten))?;
            report.links_rewritten += 1;
        }
        for (position, agreement, outcome) in outcomes {
            report.record(position, agreement, outcome);
        }
        Ok(())
    }

    /// Link element for the curator, with its ordering key
    ///
    /// The key orders survivors by the first contributing annotator's array.
    /// A filler whose own position was not merged drops the element.
    fn resolve_link(
        &self,
        diff: &DiffResult,
        item: &ConfigurationItem,
        sources: &Sources<'_>,
        curator: &AnnotationGraph,
        position: &Position,
    ) -> Result<Filler, MergeError> {
        let source = source_graph(sources, item)?;
        let slot = item
            .slot
            .as_ref()
            .ok_or(MergeError::Graph(GraphError::InvalidHandle(item.node)))?;
        let host = source.node(item.node)?;
        let link = host.links(&slot.feature).get(slot.index).ok_or_else(|| {
            MergeError::NoSuchLink {
                type_name: host.type_name().to_string(),
                feature: slot.feature.clone(),
                index: slot.index,
            }
        })?;

        let target_position = self
            .indexer()
            .target_position(source, slot.target)?
            .ok_or_else(|| MergeError::LooseEnds {
                position: position.clone(),
                endpoint: Endpoint::Target,
            })?;
        if let Some(agreement) = diff.agreement_at(&target_position) {
            if !agreement.is_mergeable(self.options.merge_incomplete) {
                debug!(position = %position, filler = %target_position, %agreement, "filler not merged");
                return Ok(Filler::NotMerged(agreement));
            }
        }
        let target = self.resolve_unique(curator, &target_position, Endpoint::Target, position)?;

        let rank = diff
            .annotators()
            .iter()
            .position(|a| a == &item.annotator)
            .unwrap_or(usize::MAX);
        Ok(Filler::Resolved(
            (rank, slot.index),
            Link {
                role: link.role.clone(),
                target: Some(target),
            },
        ))
    }

    /// Remove relations left without an endpoint, transitively
    pub(crate) fn remove_loose_relations(&self, curator: &mut AnnotationGraph, mut work: Vec<NodeHandle>) -> usize {
        let indexer = self.indexer();
        let mut removed = 0;
        while let Some(handle) = work.pop() {
            let is_relation = curator
                .get(handle)
                .and_then(|n| self.policies.get(n.type_name()))
                .is_some_and(LayerPolicy::is_relation);
            if !is_relation || !matches!(indexer.position_of(curator, handle), Ok(None)) {
                continue;
            }
            if let Ok(removal) = curator.remove(handle) {
                debug!(node = %handle, "removed loose relation");
                removed += 1;
                work.extend(removal.detached);
            }
        }
        removed
    }
}

pub(crate) fn source_graph<'g>(
    sources: &Sources<'g>,
    item: &ConfigurationItem,
) -> Result<&'g AnnotationGraph, MergeError> {
    sources
        .get(&item.annotator)
        .copied()
        .ok_or(MergeError::Graph(GraphError::InvalidHandle(item.node)))
}
