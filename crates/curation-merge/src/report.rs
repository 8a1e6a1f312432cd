//! Merge reports
//!
//! One entry per position visited, so a human curator can see what was
//! merged and intervene on everything else.

use crate::error::MergeError;
use curation_diff::Agreement;
use curation_position::Position;
use serde::{Serialize, Serializer};

/// What happened at one position
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum Outcome {
    /// Content copied into the curator graph
    Merged,

    /// Curator already held the agreed content; nothing changed
    Unchanged,

    /// Only the curator had content here; kept as is
    Preserved,

    /// Not every annotator contributed; curator content removed
    SkippedIncomplete {
        /// Curator nodes (or link elements) removed
        removed: usize,
    },

    /// Annotators disagree; curator content removed
    SkippedDisagreement {
        /// Curator nodes (or link elements) removed
        removed: usize,
    },

    /// Curator-only node removed to make room for merged content at another
    /// position of a layer that does not allow stacking
    Displaced {
        /// Position of the merged content
        by: Position,
    },

    /// Link slot whose host is not in the curator graph
    HostNotMerged,

    /// Recoverable per-position failure
    Errored(#[serde(serialize_with = "display")] MergeError),
}

impl Outcome {
    /// Check if the position ended with agreed content in the curator graph
    #[inline]
    #[must_use]
    pub fn is_merged(&self) -> bool {
        matches!(self, Self::Merged | Self::Unchanged)
    }

    /// Error, if the position errored
    #[inline]
    #[must_use]
    pub fn error(&self) -> Option<&MergeError> {
        match self {
            Self::Errored(e) => Some(e),
            _ => None,
        }
    }
}

fn display<S: Serializer>(error: &MergeError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

/// Report entry for one position
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PositionReport {
    /// Position visited
    pub position: Position,
    /// Classification used
    pub agreement: Agreement,
    /// Outcome
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// Outcome counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeTotals {
    /// `Merged`
    pub merged: usize,
    /// `Unchanged`
    pub unchanged: usize,
    /// `Preserved`
    pub preserved: usize,
    /// `SkippedIncomplete`
    pub skipped_incomplete: usize,
    /// `SkippedDisagreement`
    pub skipped_disagreement: usize,
    /// `Displaced`
    pub displaced: usize,
    /// `HostNotMerged`
    pub host_not_merged: usize,
    /// `Errored`
    pub errored: usize,
    /// Curator nodes removed (all causes)
    pub removed: usize,
}

/// Result of a reconciliation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    /// Entries in processing order (spans, relations, link slots)
    pub entries: Vec<PositionReport>,

    /// Curator nodes removed by bootstrap
    pub bootstrap_removed: usize,

    /// Relations removed because a deletion turned them into loose ends
    pub loose_relations_removed: usize,

    /// Link arrays rewritten
    pub links_rewritten: usize,
}

impl MergeReport {
    /// Create empty report
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&mut self, position: &Position, agreement: Agreement, outcome: Outcome) {
        if let Outcome::Errored(error) = &outcome {
            tracing::warn!(position = %position, %error, "position not merged");
        }
        self.entries.push(PositionReport {
            position: position.clone(),
            agreement,
            outcome,
        });
    }

    /// Account for a curator node at `position` removed by a placement at `by`
    ///
    /// An entry that claimed the content stayed becomes `Displaced`; a skip
    /// counts one more removal. Records a new entry when the position was
    /// not visited.
    pub(crate) fn displace(&mut self, position: &Position, agreement: Agreement, by: &Position) {
        let Some(entry) = self.entries.iter_mut().find(|e| &e.position == position) else {
            self.record(position, agreement, Outcome::Displaced { by: by.clone() });
            return;
        };
        match entry.outcome {
            Outcome::Preserved | Outcome::Merged | Outcome::Unchanged => {
                entry.outcome = Outcome::Displaced { by: by.clone() };
            }
            Outcome::SkippedIncomplete { ref mut removed }
            | Outcome::SkippedDisagreement { ref mut removed } => *removed += 1,
            Outcome::Displaced { .. } | Outcome::HostNotMerged | Outcome::Errored(_) => {}
        }
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing was visited
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Outcome recorded for a position
    #[must_use]
    pub fn outcome_at(&self, position: &Position) -> Option<&Outcome> {
        self.entries
            .iter()
            .find(|e| &e.position == position)
            .map(|e| &e.outcome)
    }

    /// Recorded errors
    pub fn errors(&self) -> impl Iterator<Item = (&Position, &MergeError)> {
        self.entries
            .iter()
            .filter_map(|e| e.outcome.error().map(|err| (&e.position, err)))
    }

    /// Check if no position errored
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors().next().is_none()
    }

    /// Check if the pass changed the curator graph
    #[must_use]
    pub fn changed_curator(&self) -> bool {
        let t = self.totals();
        t.merged > 0 || t.removed > 0 || self.links_rewritten > 0
    }

    /// Outcome counters
    #[must_use]
    pub fn totals(&self) -> MergeTotals {
        let mut t = MergeTotals {
            removed: self.bootstrap_removed + self.loose_relations_removed,
            ..MergeTotals::default()
        };
        for entry in &self.entries {
            match &entry.outcome {
                Outcome::Merged => t.merged += 1,
                Outcome::Unchanged => t.unchanged += 1,
                Outcome::Preserved => t.preserved += 1,
                Outcome::SkippedIncomplete { removed } => {
                    t.skipped_incomplete += 1;
                    t.removed += removed;
                }
                Outcome::SkippedDisagreement { removed } => {
                    t.skipped_disagreement += 1;
                    t.removed += removed;
                }
                Outcome::Displaced { .. } => {
                    t.displaced += 1;
                    t.removed += 1;
                }
                Outcome::HostNotMerged => t.host_not_merged += 1,
                Outcome::Errored(_) => t.errored += 1,
            }
        }
        t
    }
}
