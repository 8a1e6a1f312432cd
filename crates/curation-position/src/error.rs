//! Indexing errors

use curation_graph::{GraphError, NodeHandle};

/// Errors raised while computing positions
///
/// All variants describe structurally malformed input; none is recoverable
/// by retrying.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndexError {
    /// Node type has no layer policy
    #[error("no layer policy for type {0:?}")]
    UnknownType(String),

    /// Attribute has the wrong value kind for its declared role
    #[error("malformed {type_name}.{attribute}: expected {expected}, found {found}")]
    Malformed {
        /// Annotation type
        type_name: String,
        /// Attribute name
        attribute: String,
        /// Expected value kind
        expected: &'static str,
        /// Actual value kind
        found: &'static str,
    },

    /// Relation endpoints nest deeper than supported (likely a cycle)
    #[error("endpoint chain too deep at {0}")]
    EndpointDepth(NodeHandle),

    /// Underlying graph lookup failed
    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl IndexError {
    /// Build a `Malformed` error
    #[must_use]
    pub fn malformed(
        type_name: &str,
        attribute: &str,
        expected: &'static str,
        found: &'static str,
    ) -> Self {
        Self::Malformed {
            type_name: type_name.to_string(),
            attribute: attribute.to_string(),
            expected,
            found,
        }
    }
}
