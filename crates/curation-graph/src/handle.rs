//! Graph and node identities
//!
//! Provides [`GraphId`] and [`NodeHandle`], the opaque references used in
//! place of pointers between nodes of an [`AnnotationGraph`](crate::AnnotationGraph).

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_GRAPH_ID: AtomicU32 = AtomicU32::new(1);

/// Identity of one annotation graph
///
/// Every graph receives a fresh id on construction, so handles minted by
/// one graph are never mistaken for handles of another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GraphId(u32);

impl GraphId {
    /// Allocate a fresh graph id
    #[inline]
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_GRAPH_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value
    #[inline]
    #[must_use]
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl Display for GraphId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// Generational handle to a node inside one graph
///
/// A handle stays valid until the node it names is removed. Slots are
/// reused after removal, but with a bumped generation, so a stale handle
/// never resolves to the node that took its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeHandle {
    graph: GraphId,
    index: u32,
    generation: u32,
}

impl NodeHandle {
    #[inline]
    pub(crate) fn new(graph: GraphId, index: u32, generation: u32) -> Self {
        Self {
            graph,
            index,
            generation,
        }
    }

    /// Owning graph
    #[inline]
    #[must_use]
    pub fn graph(&self) -> GraphId {
        self.graph
    }

    /// Arena slot index
    #[inline]
    #[must_use]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Slot generation at the time the handle was minted
    #[inline]
    #[must_use]
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl Display for NodeHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:n{}", self.graph, self.index)?;
        if self.generation > 0 {
            write!(f, "@{}", self.generation)?;
        }
        Ok(())
    }
}
