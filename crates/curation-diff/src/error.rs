//! Diff errors

use crate::annotator::AnnotatorId;
use curation_position::IndexError;

/// Errors that abort a diff computation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiffError {
    /// An annotator's graph is structurally malformed
    #[error("malformed graph of {annotator}: {source}")]
    Malformed {
        /// Owner of the offending graph
        annotator: AnnotatorId,
        /// Underlying indexing error
        #[source]
        source: IndexError,
    },

    /// Entry type has no layer policy
    #[error("entry type {0:?} has no layer policy")]
    UnknownEntryType(String),

    /// The same annotator was supplied twice
    #[error("duplicate annotator: {0}")]
    DuplicateAnnotator(AnnotatorId),
}

impl DiffError {
    /// Check if the error stems from malformed input data
    #[inline]
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed { .. } | Self::UnknownEntryType(_))
    }

    /// Annotator whose input caused the error, if attributable
    #[must_use]
    pub fn annotator(&self) -> Option<&AnnotatorId> {
        match self {
            Self::Malformed { annotator, .. } | Self::DuplicateAnnotator(annotator) => {
                Some(annotator)
            }
            Self::UnknownEntryType(_) => None,
        }
    }
}
