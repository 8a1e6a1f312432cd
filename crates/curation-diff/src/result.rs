//! Diff results

use crate::annotator::AnnotatorId;
use crate::classify::{classify, Agreement};
use crate::configuration::{ConfigurationSet, ConfigurationView};
use curation_graph::GraphId;
use curation_position::Position;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Outcome of a diff: every position observed, in position order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffResult {
    sets: BTreeMap<Position, ConfigurationSet>,
    annotators: BTreeSet<AnnotatorId>,
    entry_types: Vec<String>,
    graphs: BTreeMap<AnnotatorId, GraphId>,
}

impl DiffResult {
    pub(crate) fn new(
        sets: BTreeMap<Position, ConfigurationSet>,
        annotators: BTreeSet<AnnotatorId>,
        entry_types: Vec<String>,
        graphs: BTreeMap<AnnotatorId, GraphId>,
    ) -> Self {
        Self {
            sets,
            annotators,
            entry_types,
            graphs,
        }
    }

    /// Annotators the classification runs over
    #[inline]
    #[must_use]
    pub fn annotators(&self) -> &BTreeSet<AnnotatorId> {
        &self.annotators
    }

    /// Replace the considered annotators
    ///
    /// Include [`AnnotatorId::curator`] to make the curator's markup count
    /// towards agreement.
    #[must_use]
    pub fn with_annotators(mut self, annotators: impl IntoIterator<Item = AnnotatorId>) -> Self {
        self.annotators = annotators.into_iter().collect();
        self
    }

    /// Types the diff was computed over
    #[inline]
    #[must_use]
    pub fn entry_types(&self) -> &[String] {
        &self.entry_types
    }

    /// Graph the annotator's items were taken from
    #[inline]
    #[must_use]
    pub fn graph_of(&self, annotator: &AnnotatorId) -> Option<GraphId> {
        self.graphs.get(annotator).copied()
    }

    /// All annotators whose graphs were diffed, curator included
    pub fn sources(&self) -> impl Iterator<Item = (&AnnotatorId, GraphId)> {
        self.graphs.iter().map(|(a, g)| (a, *g))
    }

    /// Number of positions
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    /// Check if nothing was observed
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Configuration set at a position
    #[inline]
    #[must_use]
    pub fn configuration_set(&self, position: &Position) -> Option<&ConfigurationSet> {
        self.sets.get(position)
    }

    /// Iterate configuration sets in position order
    pub fn iter(&self) -> impl Iterator<Item = &ConfigurationSet> {
        self.sets.values()
    }

    /// Classify one set over the considered annotators
    #[inline]
    #[must_use]
    pub fn classify(&self, set: &ConfigurationSet) -> Agreement {
        classify(set, &self.annotators)
    }

    /// Agreement at a position, if observed
    #[must_use]
    pub fn agreement_at(&self, position: &Position) -> Option<Agreement> {
        self.sets.get(position).map(|s| self.classify(s))
    }

    /// Sets classified `Agree`
    #[must_use]
    pub fn agreeing(&self) -> Vec<&ConfigurationSet> {
        self.with_status(Agreement::Agree)
    }

    /// Sets classified `Disagree`
    #[must_use]
    pub fn disagreeing(&self) -> Vec<&ConfigurationSet> {
        self.with_status(Agreement::Disagree)
    }

    /// Sets classified `Incomplete`
    #[must_use]
    pub fn incomplete(&self) -> Vec<&ConfigurationSet> {
        self.with_status(Agreement::Incomplete)
    }

    fn with_status(&self, status: Agreement) -> Vec<&ConfigurationSet> {
        self.iter().filter(|s| self.classify(s) == status).collect()
    }

    /// Agreement counts, overall and per type
    #[must_use]
    pub fn summary(&self) -> DiffSummary {
        let mut summary = DiffSummary::default();
        for set in self.iter() {
            let status = self.classify(set);
            summary.counts.record(status);
            summary
                .by_type
                .entry(set.position().type_name().to_string())
                .or_default()
                .record(status);
        }
        summary
    }

    /// Reporting rows, one per position
    #[must_use]
    pub fn rows(&self) -> Vec<DiffRow> {
        self.iter()
            .map(|set| DiffRow {
                position: set.position().clone(),
                agreement: self.classify(set),
                configurations: set.views(),
            })
            .collect()
    }
}

/// Agreement counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AgreementCounts {
    /// Positions observed
    pub total: usize,
    /// `Agree` positions
    pub agree: usize,
    /// `Disagree` positions
    pub disagree: usize,
    /// `Incomplete` positions
    pub incomplete: usize,
}

impl AgreementCounts {
    fn record(&mut self, status: Agreement) {
        self.total += 1;
        match status {
            Agreement::Agree => self.agree += 1,
            Agreement::Disagree => self.disagree += 1,
            Agreement::Incomplete => self.incomplete += 1,
        }
    }
}

/// Summary of a diff
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiffSummary {
    /// Overall counts
    #[serde(flatten)]
    pub counts: AgreementCounts,
    /// Counts per annotation type
    pub by_type: BTreeMap<String, AgreementCounts>,
}

/// One reporting row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffRow {
    /// Position
    pub position: Position,
    /// Classification
    pub agreement: Agreement,
    /// Configurations observed
    pub configurations: Vec<ConfigurationView>,
}
