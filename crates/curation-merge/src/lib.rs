//! Curation Merge
//!
//! Populates a curator graph from the diff of several annotators' graphs.
//!
//! # Core Concepts
//!
//! - [`Reconciler`]: deterministic merge in position order (spans,
//!   relations, then link arrays element by element)
//! - [`MergeReport`]: per-position [`Outcome`] plus totals
//! - [`MergeCoordinator`]: one lock per document, documents in parallel
//! - [`CurationConfig`]: TOML configuration of layers, diff and merge options
//!
//! Only positions where every considered annotator made exactly the same
//! annotation are merged; everything else is removed from the curator graph
//! and left to a human curator, who can accept single annotations through
//! [`Reconciler::merge_single_span`] and friends.
//!
//! # Example
//!
//! ```rust
//! use curation_merge::{AnnotatorId, LayerPolicy, MergeOptions, PolicyTable, Reconciler};
//! use curation_graph::AnnotationGraph;
//!
//! let policies = PolicyTable::new().with(LayerPolicy::span("POS").compare("value"));
//!
//! let mut alice = AnnotationGraph::new();
//! alice.build("POS", 0, 4).attr("value", "NN").insert().unwrap();
//! let mut bob = AnnotationGraph::new();
//! bob.build("POS", 0, 4).attr("value", "NN").insert().unwrap();
//!
//! let mut curator = AnnotationGraph::new();
//! let report = Reconciler::new(&policies, MergeOptions::default())
//!     .run(
//!         &["POS"],
//!         &mut curator,
//!         [(AnnotatorId::from("alice"), &alice), (AnnotatorId::from("bob"), &bob)],
//!     )
//!     .unwrap();
//!
//! assert_eq!(report.totals().merged, 1);
//! assert_eq!(curator.select_at("POS", 0, 4).len(), 1);
//! ```

#![warn(unreachable_pub)]

mod config;
mod coordinator;
mod error;
mod reconciler;
mod report;
mod single;

// Re-exports
pub use config::{CurationConfig, MergeOptions};
pub use coordinator::{CoordinatorStats, MergeCoordinator};
pub use error::{ConfigError, Endpoint, MergeError, ReconcileError};
pub use reconciler::Reconciler;
pub use report::{MergeReport, MergeTotals, Outcome, PositionReport};
pub use single::{LinkPlacement, Placement};

// Pipeline re-exports
pub use curation_diff::{
    compute_diff, Agreement, AnnotatorId, DiffEngine, DiffError, DiffOptions, DiffResult,
    DiffSummary, CURATOR,
};
pub use curation_position::{LayerPolicy, LinkCompareMode, PolicyTable, Position};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for running a curation pass
    pub use crate::{
        Agreement, AnnotatorId, CurationConfig, DiffEngine, MergeOptions, MergeReport, Outcome,
        PolicyTable, Position, Reconciler,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
