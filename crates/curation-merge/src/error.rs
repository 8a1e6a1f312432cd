//! Error types for merging
//!
//! - [`MergeError`]: per-item failures, recorded in the report; the batch goes on
//! - [`ReconcileError`]: fatal, raised before the curator graph is touched
//! - [`ConfigError`]: configuration loading

use curation_diff::DiffError;
use curation_graph::GraphError;
use curation_position::{IndexError, Position};
use std::path::PathBuf;

/// Which relation endpoint an error concerns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    /// Source endpoint
    Source,
    /// Target endpoint (also used for link fillers)
    Target,
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Source => "source",
            Self::Target => "target",
        })
    }
}

/// Recoverable failure for one position or item
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MergeError {
    /// Endpoint (or link filler) has no counterpart in the curator graph
    #[error("loose ends at {position}: {endpoint} not present in curator graph")]
    LooseEnds {
        /// Position being merged
        position: Position,
        /// Missing endpoint
        endpoint: Endpoint,
    },

    /// Several curator nodes could serve as the endpoint
    #[error("ambiguous {endpoint} at {position}: {candidates} stacked candidates")]
    AmbiguousEndpoint {
        /// Position being merged
        position: Position,
        /// Ambiguous endpoint
        endpoint: Endpoint,
        /// Number of candidates found
        candidates: usize,
    },

    /// An equivalent annotation is already in the curator graph
    #[error("annotation already exists at {0}")]
    AlreadyExists(Position),

    /// Link host is absent from the curator graph or stacked there
    #[error("no unique host for {position}: {candidates} candidates")]
    NoUniqueHost {
        /// Host position
        position: Position,
        /// Number of candidates found
        candidates: usize,
    },

    /// Type has no layer policy
    #[error("no layer policy for type {0:?}")]
    UnknownLayer(String),

    /// Link element does not exist in the source
    #[error("{type_name}.{feature}[{index}] is not a declared link element")]
    NoSuchLink {
        /// Host type
        type_name: String,
        /// Link feature
        feature: String,
        /// Element index
        index: usize,
    },

    /// Position computation failed
    #[error(transparent)]
    Index(#[from] IndexError),

    /// Graph mutation failed
    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl MergeError {
    /// Check if the batch may continue past this error
    ///
    /// Structural failures (`Index`, `Graph`) indicate a bug or corrupted
    /// input rather than a content conflict.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Index(_) | Self::Graph(_))
    }

    /// Check if a human curator has to resolve the situation
    #[inline]
    #[must_use]
    pub fn requires_curator(&self) -> bool {
        matches!(
            self,
            Self::LooseEnds { .. } | Self::AmbiguousEndpoint { .. } | Self::NoUniqueHost { .. }
        )
    }

    /// Position the error concerns, if any
    #[must_use]
    pub fn position(&self) -> Option<&Position> {
        match self {
            Self::LooseEnds { position, .. }
            | Self::AmbiguousEndpoint { position, .. }
            | Self::NoUniqueHost { position, .. }
            | Self::AlreadyExists(position) => Some(position),
            _ => None,
        }
    }
}

/// Fatal reconciliation failure; the curator graph is left untouched
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReconcileError {
    /// Inputs do not fit together
    #[error("malformed input: {0}")]
    Malformed(String),

    /// Diff computation failed
    #[error("diff failed: {0}")]
    Diff(#[from] DiffError),

    /// Position computation failed during validation
    #[error("indexing failed: {0}")]
    Index(#[from] IndexError),

    /// Graph lookup failed during validation
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    /// Document is not registered with the coordinator
    #[error("unknown document {0:?}")]
    UnknownDocument(String),
}

impl ReconcileError {
    /// Check if the error stems from malformed input
    #[inline]
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        match self {
            Self::Malformed(_) | Self::Index(_) | Self::Graph(_) => true,
            Self::Diff(e) => e.is_malformed(),
            Self::UnknownDocument(_) => false,
        }
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// TOML syntax or shape error
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Configuration parsed but is inconsistent
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
