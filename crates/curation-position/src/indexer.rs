//! Position indexer
//!
//! Computes the [`Position`] of a node from graph content alone, so the
//! result does not depend on traversal order or node identity.

use crate::error::IndexError;
use crate::policy::{LayerPolicy, LinkCompareMode, PolicyTable};
use crate::position::{Position, SlotKey};
use curation_graph::{AnnotationGraph, Node, NodeHandle, Scalar, Value};
use tracing::debug;

/// Maximum nesting of relation endpoints (relations over relations)
pub const MAX_ENDPOINT_DEPTH: usize = 32;

/// Compared value of one link slot
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SlotValue {
    /// Filler position (`ByTarget`)
    Target(Position),
    /// Role label (`ByRole`)
    Role(String),
    /// Presence only (`ByBoth`)
    Present,
}

/// One element of a diff-relevant link array, positioned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotEntry {
    /// Slot position (host position plus slot key)
    pub position: Position,
    /// Link feature name
    pub feature: String,
    /// Index of the element in the host's link array
    pub index: usize,
    /// Filler node
    pub target: NodeHandle,
    /// Value compared for agreement
    pub value: SlotValue,
}

/// Computes positions under a policy table
#[derive(Debug, Clone, Copy)]
pub struct PositionIndexer<'p> {
    policies: &'p PolicyTable,
}

impl<'p> PositionIndexer<'p> {
    /// Create indexer
    #[inline]
    #[must_use]
    pub fn new(policies: &'p PolicyTable) -> Self {
        Self { policies }
    }

    /// Policy table in use
    #[inline]
    #[must_use]
    pub fn policies(&self) -> &'p PolicyTable {
        self.policies
    }

    /// Base position of a node
    ///
    /// Returns `Ok(None)` for a relation with a null or dangling endpoint
    /// (a loose end).
    ///
    /// # Errors
    /// `UnknownType` when the node's type has no policy, `Malformed` when an
    /// endpoint or discriminant attribute has the wrong kind, and handle
    /// errors for `handle`
    pub fn position_of(
        &self,
        graph: &AnnotationGraph,
        handle: NodeHandle,
    ) -> Result<Option<Position>, IndexError> {
        let node = graph.node(handle)?;
        self.position_of_node(graph, node)
    }

    /// Base position of a node already looked up
    ///
    /// # Errors
    /// See [`PositionIndexer::position_of`]
    pub fn position_of_node(
        &self,
        graph: &AnnotationGraph,
        node: &Node,
    ) -> Result<Option<Position>, IndexError> {
        let policy = self.policies.require(node.type_name())?;
        self.compute(graph, node, Some(policy), 0)
    }

    /// Position of a referenced node
    ///
    /// Unlike [`PositionIndexer::position_of`], the referenced node's type
    /// need not have a policy (tokens and other base layers are positioned
    /// by type and offsets alone), and a dangling handle yields `Ok(None)`.
    ///
    /// # Errors
    /// `Malformed` for structural problems in the referenced node
    pub fn target_position(
        &self,
        graph: &AnnotationGraph,
        handle: NodeHandle,
    ) -> Result<Option<Position>, IndexError> {
        match graph.get(handle) {
            Some(node) => self.compute(graph, node, self.policies.get(node.type_name()), 1),
            None => Ok(None),
        }
    }

    /// Positions of every element of the node's diff-relevant link arrays
    ///
    /// Elements whose target is null or dangling are skipped, as are all
    /// elements of a host that is itself a loose end.
    ///
    /// # Errors
    /// `Malformed` when a declared link feature holds something other than a
    /// link array; see also [`PositionIndexer::position_of`]
    pub fn slot_positions(
        &self,
        graph: &AnnotationGraph,
        handle: NodeHandle,
    ) -> Result<Vec<SlotEntry>, IndexError> {
        let node = graph.node(handle)?;
        let policy = self.policies.require(node.type_name())?;
        let mut entries = Vec::new();
        if policy.diff_links().next().is_none() {
            return Ok(entries);
        }
        let Some(host) = self.compute(graph, node, Some(policy), 0)? else {
            return Ok(entries);
        };

        for feature in policy.diff_links() {
            let links = match node.attribute(&feature.name) {
                None | Some(Value::Scalar(Scalar::Null)) => continue,
                Some(Value::Links(links)) => links,
                Some(other) => {
                    return Err(IndexError::malformed(
                        node.type_name(),
                        &feature.name,
                        "link array",
                        other.kind(),
                    ))
                }
            };

            for (index, link) in links.iter().enumerate() {
                let Some(target) = graph.resolve(link.target) else {
                    debug!(host = %host, feature = %feature.name, index, "skipping link without target");
                    continue;
                };
                let Some(target_pos) =
                    self.compute(graph, target, self.policies.get(target.type_name()), 1)?
                else {
                    continue;
                };

                let (key, value) = match feature.mode {
                    LinkCompareMode::ByTarget => (
                        SlotKey {
                            feature: feature.name.clone(),
                            role: Some(link.role.clone()),
                            target: None,
                        },
                        SlotValue::Target(target_pos),
                    ),
                    LinkCompareMode::ByRole => (
                        SlotKey {
                            feature: feature.name.clone(),
                            role: None,
                            target: Some(target_pos),
                        },
                        SlotValue::Role(link.role.clone()),
                    ),
                    LinkCompareMode::ByBoth => (
                        SlotKey {
                            feature: feature.name.clone(),
                            role: Some(link.role.clone()),
                            target: Some(target_pos),
                        },
                        SlotValue::Present,
                    ),
                };

                entries.push(SlotEntry {
                    position: host.with_slot(key),
                    feature: feature.name.clone(),
                    index,
                    target: target.handle(),
                    value,
                });
            }
        }

        Ok(entries)
    }

    /// Nodes of `graph` whose base position equals `position`
    ///
    /// A slot position is matched against its host.
    ///
    /// # Errors
    /// See [`PositionIndexer::position_of`]
    pub fn nodes_at(
        &self,
        graph: &AnnotationGraph,
        position: &Position,
    ) -> Result<Vec<NodeHandle>, IndexError> {
        let wanted = if position.is_slot() {
            position.host()
        } else {
            position.clone()
        };
        let mut found = Vec::new();
        for handle in graph.select_at(wanted.type_name(), wanted.begin(), wanted.end()) {
            let node = graph.node(handle)?;
            let policy = self.policies.get(node.type_name());
            if self.compute(graph, node, policy, 0)?.as_ref() == Some(&wanted) {
                found.push(handle);
            }
        }
        Ok(found)
    }

    fn compute(
        &self,
        graph: &AnnotationGraph,
        node: &Node,
        policy: Option<&LayerPolicy>,
        depth: usize,
    ) -> Result<Option<Position>, IndexError> {
        if depth > MAX_ENDPOINT_DEPTH {
            return Err(IndexError::EndpointDepth(node.handle()));
        }
        let Some(policy) = policy else {
            return Ok(Some(Position::span(node.type_name(), node.begin(), node.end())));
        };

        let discriminant = match &policy.position_feature {
            None => None,
            Some(feature) => match node.attribute(feature) {
                None => None,
                Some(Value::Scalar(s)) => Some(s.clone()),
                Some(other) => {
                    return Err(IndexError::malformed(
                        node.type_name(),
                        feature,
                        "scalar",
                        other.kind(),
                    ))
                }
            },
        };

        let position = match policy.endpoints() {
            None => Position::span(node.type_name(), node.begin(), node.end()),
            Some((source_attr, target_attr)) => {
                let source = self.endpoint(graph, node, source_attr, depth)?;
                let target = self.endpoint(graph, node, target_attr, depth)?;
                let (Some(source), Some(target)) = (source, target) else {
                    debug!(node = %node.handle(), type_name = node.type_name(), "loose end");
                    return Ok(None);
                };
                Position::relation(node.type_name(), node.begin(), node.end(), source, target)
            }
        };

        Ok(Some(position.with_discriminant(discriminant)))
    }

    fn endpoint(
        &self,
        graph: &AnnotationGraph,
        node: &Node,
        attribute: &str,
        depth: usize,
    ) -> Result<Option<Position>, IndexError> {
        match node.attribute(attribute) {
            None | Some(Value::Ref(None) | Value::Scalar(Scalar::Null)) => Ok(None),
            Some(Value::Ref(Some(handle))) => match graph.get(*handle) {
                Some(target) => {
                    self.compute(graph, target, self.policies.get(target.type_name()), depth + 1)
                }
                None => Ok(None),
            },
            Some(other) => Err(IndexError::malformed(
                node.type_name(),
                attribute,
                "reference",
                other.kind(),
            )),
        }
    }
}
