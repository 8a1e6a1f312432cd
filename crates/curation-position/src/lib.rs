//! Curation Positions
//!
//! Alignment keys for annotations made by different annotators.
//!
//! # Overview
//!
//! - **[`PolicyTable`]**: per-type layer policy (compared attributes,
//!   discriminant, relation endpoints, link features, stacking)
//! - **[`Position`]**: identity-free, totally ordered alignment key
//! - **[`PositionIndexer`]**: computes positions of nodes and link slots
//!
//! # Example
//!
//! ```rust
//! use curation_graph::AnnotationGraph;
//! use curation_position::{LayerPolicy, PolicyTable, Position, PositionIndexer};
//!
//! let policies = PolicyTable::new().with(LayerPolicy::span("POS").compare("value"));
//! let indexer = PositionIndexer::new(&policies);
//!
//! let mut graph = AnnotationGraph::new();
//! let h = graph.build("POS", 0, 4).attr("value", "NN").insert().unwrap();
//!
//! assert_eq!(indexer.position_of(&graph, h).unwrap(), Some(Position::span("POS", 0, 4)));
//! ```

#![warn(unreachable_pub)]

pub mod error;
pub mod indexer;
pub mod policy;
pub mod position;

// Re-exports
pub use error::IndexError;
pub use indexer::{PositionIndexer, SlotEntry, SlotValue, MAX_ENDPOINT_DEPTH};
pub use policy::{LayerKind, LayerPolicy, LinkCompareMode, LinkFeature, PolicyTable};
pub use position::{Endpoints, Position, SlotKey};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for position computation
    pub use crate::{
        IndexError, LayerPolicy, LinkCompareMode, PolicyTable, Position, PositionIndexer, SlotEntry,
        SlotValue,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
