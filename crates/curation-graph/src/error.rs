//! Graph model errors

use crate::handle::{GraphId, NodeHandle};

/// Errors raised by graph mutation and lookup
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// Handle names a removed (or never allocated) node
    #[error("invalid handle: {0}")]
    InvalidHandle(NodeHandle),

    /// Handle was minted by another graph
    #[error("handle {handle} belongs to graph {owner}, not {graph}")]
    ForeignHandle {
        /// Offending handle
        handle: NodeHandle,
        /// Graph that minted it
        owner: GraphId,
        /// Graph it was used with
        graph: GraphId,
    },

    /// Span offsets are inverted
    #[error("invalid offsets: begin {begin} > end {end}")]
    InvalidOffsets {
        /// Begin offset
        begin: usize,
        /// End offset
        end: usize,
    },

    /// Interchange document references an id it does not define
    #[error("unknown node id in document: {0}")]
    UnknownReference(u64),

    /// Interchange document defines the same id twice
    #[error("duplicate node id in document: {0}")]
    DuplicateId(u64),

    /// Arena cannot address more nodes
    #[error("graph capacity exceeded")]
    CapacityExceeded,
}

impl GraphError {
    /// Check if the error concerns a stale or foreign handle
    #[inline]
    #[must_use]
    pub fn is_handle_error(&self) -> bool {
        matches!(self, Self::InvalidHandle(_) | Self::ForeignHandle { .. })
    }
}
