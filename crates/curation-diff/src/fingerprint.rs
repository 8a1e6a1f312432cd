//! Structural fingerprints
//!
//! Two items at the same position are in the same configuration iff their
//! fingerprints are equal. References compare by the referenced node's
//! position, never by handle, so fingerprints are comparable across graphs.

use crate::annotator::AnnotatorId;
use curation_graph::{AnnotationGraph, Node, NodeHandle, Scalar, Value};
use curation_position::{IndexError, LayerPolicy, Position, PositionIndexer, SlotValue};
use std::fmt::{self, Display, Formatter};
use tracing::warn;

/// Comparable form of one attribute value
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FeatureKey {
    /// Primitive value (absent attributes compare as null)
    Scalar(Scalar),
    /// Reference, by referenced position
    Ref(Option<Position>),
    /// Undeclared link array, compared whole as `(role, target position)`
    Links(Vec<(String, Option<Position>)>),
}

impl Display for FeatureKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(s) => write!(f, "{s}"),
            Self::Ref(Some(p)) => write!(f, "->{p}"),
            Self::Ref(None) => f.write_str("->null"),
            Self::Links(links) => {
                f.write_str("[")?;
                for (i, (role, target)) in links.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    match target {
                        Some(t) => write!(f, "{role}:{t}")?,
                        None => write!(f, "{role}:null")?,
                    }
                }
                f.write_str("]")
            }
        }
    }
}

/// Equivalence key of an item within its position
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Fingerprint {
    /// Compared attribute values of an annotation, in policy order
    Values(Vec<(String, FeatureKey)>),

    /// Compared value of a link slot
    Slot(SlotValue),

    /// Item whose references could not be resolved; equal to nothing else
    NonComparable {
        /// Owner of the item
        annotator: AnnotatorId,
        /// Offending node
        node: NodeHandle,
    },
}

impl Fingerprint {
    /// Fingerprint of an annotation node under its layer policy
    ///
    /// Relation endpoints are already part of the position and declared link
    /// features are compared per slot, so neither enters the fingerprint.
    /// An unresolvable reference yields [`Fingerprint::NonComparable`].
    #[must_use]
    pub fn of_node(
        indexer: &PositionIndexer<'_>,
        graph: &AnnotationGraph,
        node: &Node,
        policy: &LayerPolicy,
        annotator: &AnnotatorId,
    ) -> Self {
        let mut values = Vec::with_capacity(policy.compared.len());
        for name in &policy.compared {
            if policy.is_endpoint(name) || policy.is_link(name) {
                continue;
            }
            let key = match node.attribute(name) {
                None => Ok(FeatureKey::Scalar(Scalar::Null)),
                Some(Value::Scalar(s)) => Ok(FeatureKey::Scalar(s.clone())),
                Some(Value::Ref(None)) => Ok(FeatureKey::Ref(None)),
                Some(Value::Ref(Some(h))) => {
                    resolve(indexer, graph, *h).map(|p| FeatureKey::Ref(Some(p)))
                }
                Some(Value::Links(links)) => links
                    .iter()
                    .map(|l| match l.target {
                        Some(h) => resolve(indexer, graph, h).map(|p| (l.role.clone(), Some(p))),
                        None => Ok((l.role.clone(), None)),
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(FeatureKey::Links),
            };

            match key {
                Ok(key) => values.push((name.clone(), key)),
                Err(reason) => {
                    warn!(
                        annotator = %annotator,
                        node = %node.handle(),
                        attribute = %name,
                        reason = %reason,
                        "unresolvable reference, item is not comparable"
                    );
                    return Self::NonComparable {
                        annotator: annotator.clone(),
                        node: node.handle(),
                    };
                }
            }
        }
        Self::Values(values)
    }

    /// Check if the fingerprint can equal another item's
    #[inline]
    #[must_use]
    pub fn is_comparable(&self) -> bool {
        !matches!(self, Self::NonComparable { .. })
    }
}

impl Display for Fingerprint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Values(values) if values.is_empty() => f.write_str("(present)"),
            Self::Values(values) => {
                for (i, (name, key)) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{name}={key}")?;
                }
                Ok(())
            }
            Self::Slot(SlotValue::Target(p)) => write!(f, "->{p}"),
            Self::Slot(SlotValue::Role(role)) => write!(f, "role={role}"),
            Self::Slot(SlotValue::Present) => f.write_str("(present)"),
            Self::NonComparable { annotator, node } => {
                write!(f, "(not comparable: {annotator}/{node})")
            }
        }
    }
}

#[derive(Debug)]
enum Unresolved {
    Dangling(NodeHandle),
    LooseEnd(NodeHandle),
    Index(IndexError),
}

impl Display for Unresolved {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dangling(h) => write!(f, "dangling handle {h}"),
            Self::LooseEnd(h) => write!(f, "referenced relation {h} is a loose end"),
            Self::Index(e) => write!(f, "{e}"),
        }
    }
}

fn resolve(
    indexer: &PositionIndexer<'_>,
    graph: &AnnotationGraph,
    handle: NodeHandle,
) -> Result<Position, Unresolved> {
    if !graph.contains(handle) {
        return Err(Unresolved::Dangling(handle));
    }
    match indexer.target_position(graph, handle) {
        Ok(Some(p)) => Ok(p),
        Ok(None) => Err(Unresolved::LooseEnd(handle)),
        Err(e) => Err(Unresolved::Index(e)),
    }
}
