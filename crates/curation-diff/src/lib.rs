//! Curation Diff
//!
//! Aligns the annotation graphs of several annotators by position and
//! classifies every position as agreeing, disagreeing, or incomplete.
//!
//! # Core Concepts
//!
//! - [`DiffEngine`]: buckets items by [`Position`](curation_position::Position),
//!   then partitions each bucket by [`Fingerprint`]
//! - [`ConfigurationSet`]: everything observed at one position
//! - [`classify`]: exact-agreement classification, disagreement first
//! - [`DiffResult`]: ordered result with agreeing / disagreeing / incomplete views
//!
//! # Example
//!
//! ```rust
//! use curation_diff::{compute_diff, Agreement, AnnotatorId};
//! use curation_graph::AnnotationGraph;
//! use curation_position::{LayerPolicy, PolicyTable};
//!
//! let policies = PolicyTable::new().with(LayerPolicy::span("POS").compare("value"));
//!
//! let mut alice = AnnotationGraph::new();
//! alice.build("POS", 0, 4).attr("value", "NN").insert().unwrap();
//! let mut bob = AnnotationGraph::new();
//! bob.build("POS", 0, 4).attr("value", "VB").insert().unwrap();
//!
//! let diff = compute_diff(
//!     &["POS"],
//!     &policies,
//!     [(AnnotatorId::from("alice"), &alice), (AnnotatorId::from("bob"), &bob)],
//! )
//! .unwrap();
//!
//! assert_eq!(diff.summary().counts.disagree, 1);
//! let set = diff.iter().next().unwrap();
//! assert_eq!(diff.classify(set), Agreement::Disagree);
//! ```

#![warn(unreachable_pub)]

mod annotator;
mod classify;
mod configuration;
mod engine;
mod error;
mod fingerprint;
mod result;

// Re-exports
pub use annotator::{AnnotatorId, CURATOR};
pub use classify::{classify, Agreement};
pub use configuration::{
    Configuration, ConfigurationItem, ConfigurationSet, ConfigurationView, SlotRef,
};
pub use engine::{compute_diff, DiffEngine, DiffOptions};
pub use error::DiffError;
pub use fingerprint::{FeatureKey, Fingerprint};
pub use result::{AgreementCounts, DiffResult, DiffRow, DiffSummary};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
