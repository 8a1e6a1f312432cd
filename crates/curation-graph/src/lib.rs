//! Curation Graph Model
//!
//! In-memory annotation graphs: one annotator's markup over one document.
//!
//! # Core Concepts
//!
//! - [`AnnotationGraph`]: arena of [`Node`]s owned by one annotator (or the curator)
//! - [`NodeHandle`]: generational handle used instead of pointers between nodes
//! - [`Value`]: scalar, node reference, or role-labelled [`Link`] array
//! - [`GraphDocument`]: JSON interchange form with document-local ids
//!
//! # Example
//!
//! ```rust
//! use curation_graph::{AnnotationGraph, Value};
//!
//! let mut graph = AnnotationGraph::new();
//! let gov = graph.build("Token", 0, 4).insert().unwrap();
//! let dep = graph.build("Token", 5, 9).insert().unwrap();
//! let rel = graph
//!     .build("Dependency", 5, 9)
//!     .attr("governor", gov)
//!     .attr("dependent", dep)
//!     .attr("label", "nsubj")
//!     .insert()
//!     .unwrap();
//!
//! // Removing an endpoint turns the relation into a loose end
//! let removal = graph.remove(gov).unwrap();
//! assert_eq!(removal.detached, vec![rel]);
//! assert_eq!(graph.node(rel).unwrap().attribute("governor"), Some(&Value::Ref(None)));
//! ```

#![warn(unreachable_pub)]

mod document;
mod error;
mod graph;
mod handle;
mod value;

// Re-exports
pub use document::{FeatureValue, GraphDocument, LinkDocument, NodeDocument};
pub use error::GraphError;
pub use graph::{AnnotationGraph, Node, NodeBuilder, Removal};
pub use handle::{GraphId, NodeHandle};
pub use value::{Link, Scalar, Value};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
