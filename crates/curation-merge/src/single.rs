//! Single-item merges and node placement
//!
//! Used by the reconciler for every agreed position, and directly by a
//! human curator who accepts one annotator's annotation or link element.

use crate::error::{Endpoint, MergeError};
use crate::reconciler::Reconciler;
use curation_diff::{AnnotatorId, Fingerprint};
use curation_graph::{AnnotationGraph, Link, Node, NodeHandle, Value};
use curation_position::{LayerPolicy, LinkCompareMode, Position};
use indexmap::IndexMap;
use tracing::debug;

/// Where a merged annotation ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// New curator node
    Created(NodeHandle),
    /// Existing curator node whose compared attributes were overwritten
    /// (layer does not allow stacking)
    Overwritten(NodeHandle),
}

impl Placement {
    /// Curator node holding the merged annotation
    #[inline]
    #[must_use]
    pub fn handle(&self) -> NodeHandle {
        match self {
            Self::Created(h) | Self::Overwritten(h) => *h,
        }
    }
}

/// Curator nodes removed by a placement
///
/// A layer that does not allow stacking holds one node per offsets, so
/// content at another position of the same offsets gives way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Displacement {
    /// Positions of the removed nodes
    pub(crate) positions: Vec<Position>,
    /// Nodes whose references the removal nulled
    pub(crate) detached: Vec<NodeHandle>,
}

/// How a merged link element entered the curator's array
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkPlacement {
    /// Appended at the end
    Appended,
    /// Replaced the element occupying the same slot
    Replaced {
        /// Element that was replaced
        previous: Link,
    },
}

impl Reconciler<'_> {
    /// Copy one span annotation into the curator graph
    ///
    /// Relation types are delegated to [`Reconciler::merge_single_relation`].
    /// When the layer does not allow stacking, a curator node at the same
    /// position is overwritten, and nodes of the same type and offsets at
    /// other positions are removed along with relations left loose.
    ///
    /// # Errors
    /// `AlreadyExists` when an equivalent annotation is present at the same
    /// position; `UnknownLayer` when the type has no policy
    pub fn merge_single_span(
        &self,
        source: &AnnotationGraph,
        node: NodeHandle,
        curator: &mut AnnotationGraph,
    ) -> Result<Placement, MergeError> {
        let n = source.node(node)?;
        let policy = self.policy(n.type_name())?;
        if policy.is_relation() {
            return self.merge_single_relation(source, node, curator);
        }
        let position = Position::span(n.type_name(), n.begin(), n.end())
            .with_discriminant(self.discriminant(n, policy));
        self.reject_duplicate(source, n, policy, curator, &position)?;
        let (placement, displaced) = self.place_node(source, n, policy, curator, &position, None)?;
        self.settle(curator, displaced);
        Ok(placement)
    }

    /// Copy one relation annotation into the curator graph
    ///
    /// Both endpoints must already have exactly one counterpart in the
    /// curator graph.
    ///
    /// # Errors
    /// `LooseEnds` or `AmbiguousEndpoint` for unresolved endpoints, and the
    /// errors of [`Reconciler::merge_single_span`]
    pub fn merge_single_relation(
        &self,
        source: &AnnotationGraph,
        node: NodeHandle,
        curator: &mut AnnotationGraph,
    ) -> Result<Placement, MergeError> {
        let n = source.node(node)?;
        let policy = self.policy(n.type_name())?;
        let Some((source_attr, target_attr)) = policy.endpoints() else {
            return self.merge_single_span(source, node, curator);
        };

        let indexer = self.indexer();
        let fallback = Position::span(n.type_name(), n.begin(), n.end());
        let position = indexer.position_of_node(source, n)?;
        let reported = position.clone().unwrap_or_else(|| fallback.clone());

        let mut resolved = Vec::with_capacity(2);
        for (attr, endpoint) in [(source_attr, Endpoint::Source), (target_attr, Endpoint::Target)] {
            let loose = || MergeError::LooseEnds {
                position: reported.clone(),
                endpoint,
            };
            let handle = n.attribute(attr).and_then(Value::as_ref_handle).ok_or_else(loose)?;
            let endpoint_position = indexer.target_position(source, handle)?.ok_or_else(loose)?;
            resolved.push(self.resolve_unique(curator, &endpoint_position, endpoint, &reported)?);
        }
        let endpoints = (resolved[0], resolved[1]);

        let position = position.ok_or_else(|| MergeError::LooseEnds {
            position: fallback,
            endpoint: Endpoint::Source,
        })?;
        self.reject_duplicate(source, n, policy, curator, &position)?;
        let (placement, displaced) =
            self.place_node(source, n, policy, curator, &position, Some(endpoints))?;
        self.settle(curator, displaced);
        Ok(placement)
    }

    /// Copy one link element into the curator's counterpart of its host
    ///
    /// The element replaces whatever occupies the same slot under the
    /// feature's compare mode: the element with the same target (by role),
    /// the same role (by target), or nothing (by both).
    ///
    /// # Errors
    /// `NoSuchLink` when the element does not exist or the feature is not a
    /// declared link; `NoUniqueHost` when the host is absent from or stacked
    /// in the curator graph; `LooseEnds`/`AmbiguousEndpoint` for the filler;
    /// `AlreadyExists` when an identical element is present
    pub fn merge_single_link(
        &self,
        source: &AnnotationGraph,
        host: NodeHandle,
        feature: &str,
        index: usize,
        curator: &mut AnnotationGraph,
    ) -> Result<LinkPlacement, MergeError> {
        let host_node = source.node(host)?;
        let policy = self.policy(host_node.type_name())?;
        let no_such_link = || MergeError::NoSuchLink {
            type_name: host_node.type_name().to_string(),
            feature: feature.to_string(),
            index,
        };
        let link_feature = policy.link(feature).ok_or_else(no_such_link)?;
        let link = host_node.links(feature).get(index).ok_or_else(no_such_link)?;

        let indexer = self.indexer();
        let host_position = indexer.position_of_node(source, host_node)?.ok_or_else(|| {
            MergeError::LooseEnds {
                position: Position::span(host_node.type_name(), host_node.begin(), host_node.end()),
                endpoint: Endpoint::Source,
            }
        })?;
        let filler_loose = || MergeError::LooseEnds {
            position: host_position.clone(),
            endpoint: Endpoint::Target,
        };
        let target_position = match link.target {
            Some(t) => indexer.target_position(source, t)?,
            None => None,
        }
        .ok_or_else(filler_loose)?;

        let hosts = indexer.nodes_at(curator, &host_position)?;
        let [curator_host] = hosts.as_slice() else {
            return Err(MergeError::NoUniqueHost {
                position: host_position,
                candidates: hosts.len(),
            });
        };
        let curator_host = *curator_host;
        let target = self.resolve_unique(curator, &target_position, Endpoint::Target, &host_position)?;

        let element = Link {
            role: link.role.clone(),
            target: Some(target),
        };
        let mut links = curator.node(curator_host)?.links(feature).to_vec();
        if links.contains(&element) {
            return Err(MergeError::AlreadyExists(host_position));
        }

        let occupied = match link_feature.mode {
            LinkCompareMode::ByRole => links.iter().position(|l| l.target == element.target),
            LinkCompareMode::ByTarget => links.iter().position(|l| l.role == element.role),
            LinkCompareMode::ByBoth => None,
        };
        let placement = match occupied {
            Some(i) => LinkPlacement::Replaced {
                previous: std::mem::replace(&mut links[i], element),
            },
            None => {
                links.push(element);
                LinkPlacement::Appended
            }
        };
        curator.set_attribute(curator_host, feature, Value::Links(links))?;
        debug!(host = %host_position, feature, index, "merged link element");
        Ok(placement)
    }

    /// Insert (or overwrite) the curator counterpart of `node` at `position`
    ///
    /// `endpoints` are the curator handles of a relation's endpoints. Without
    /// stacking, a curator node at `position` is overwritten and nodes of the
    /// same type and offsets at other positions are removed.
    pub(crate) fn place_node(
        &self,
        source: &AnnotationGraph,
        node: &Node,
        policy: &LayerPolicy,
        curator: &mut AnnotationGraph,
        position: &Position,
        endpoints: Option<(NodeHandle, NodeHandle)>,
    ) -> Result<(Placement, Displacement), MergeError> {
        let mut attributes = self.copy_attributes(source, node, policy, curator, endpoints)?;
        let mut displaced = Displacement::default();
        if policy.allow_stacking {
            let handle = curator.insert(node.type_name(), node.begin(), node.end(), attributes)?;
            return Ok((Placement::Created(handle), displaced));
        }

        let indexer = self.indexer();
        let occupant = indexer.nodes_at(curator, position)?.first().copied();
        let rivals: Vec<NodeHandle> = curator
            .select_at(node.type_name(), node.begin(), node.end())
            .into_iter()
            .filter(|&h| Some(h) != occupant && same_endpoints(curator, h, policy, endpoints))
            .collect();
        for rival in rivals {
            if let Some(p) = indexer.position_of(curator, rival)? {
                displaced.positions.push(p);
            }
            displaced.detached.extend(curator.remove(rival)?.detached);
            forget_handle(&mut attributes, rival);
            debug!(position = %position, removed = %rival, "displaced curator node");
        }

        if let Some(occupant) = occupant {
            let overwritten = policy
                .compared
                .iter()
                .chain(policy.position_feature.iter())
                .filter(|name| !policy.is_endpoint(name) && !policy.is_link(name));
            for name in overwritten {
                let value = attributes.get(name).cloned().unwrap_or_else(Value::null);
                curator.set_attribute(occupant, name.clone(), value)?;
            }
            return Ok((Placement::Overwritten(occupant), displaced));
        }

        let handle = curator.insert(node.type_name(), node.begin(), node.end(), attributes)?;
        Ok((Placement::Created(handle), displaced))
    }

    /// Drop relations a displacement left without an endpoint
    fn settle(&self, curator: &mut AnnotationGraph, displaced: Displacement) {
        if !displaced.detached.is_empty() {
            self.remove_loose_relations(curator, displaced.detached);
        }
    }

    /// Attributes of `node` translated into curator handles
    ///
    /// Diff-relevant link arrays start empty; they are filled per element.
    /// Other references are resolved by position and nulled (or dropped
    /// from an array) when they have no unique counterpart.
    fn copy_attributes(
        &self,
        source: &AnnotationGraph,
        node: &Node,
        policy: &LayerPolicy,
        curator: &AnnotationGraph,
        endpoints: Option<(NodeHandle, NodeHandle)>,
    ) -> Result<IndexMap<String, Value>, MergeError> {
        let endpoint_names = policy.endpoints();
        let mut attributes = IndexMap::new();

        for (name, value) in node.attributes() {
            let copied = match (endpoint_names, endpoints) {
                (Some((s, _)), Some((src, _))) if s == name => Value::Ref(Some(src)),
                (Some((_, t)), Some((_, tgt))) if t == name => Value::Ref(Some(tgt)),
                _ => match value {
                    Value::Scalar(_) | Value::Ref(None) => value.clone(),
                    Value::Ref(Some(h)) => Value::Ref(self.counterpart(source, *h, curator)?),
                    Value::Links(_) if policy.link(name).is_some_and(|f| f.diff) => {
                        Value::Links(Vec::new())
                    }
                    Value::Links(links) => {
                        let mut kept = Vec::with_capacity(links.len());
                        for link in links {
                            let Some(target) = link.target else { continue };
                            if let Some(t) = self.counterpart(source, target, curator)? {
                                kept.push(Link {
                                    role: link.role.clone(),
                                    target: Some(t),
                                });
                            }
                        }
                        Value::Links(kept)
                    }
                },
            };
            attributes.insert(name.to_string(), copied);
        }
        Ok(attributes)
    }

    /// Unique curator node at the position of a source node
    fn counterpart(
        &self,
        source: &AnnotationGraph,
        handle: NodeHandle,
        curator: &AnnotationGraph,
    ) -> Result<Option<NodeHandle>, MergeError> {
        let indexer = self.indexer();
        let Some(position) = indexer.target_position(source, handle)? else {
            return Ok(None);
        };
        let found = indexer.nodes_at(curator, &position)?;
        if let [one] = found.as_slice() {
            Ok(Some(*one))
        } else {
            debug!(position = %position, candidates = found.len(), "reference has no unique counterpart");
            Ok(None)
        }
    }

    fn discriminant(&self, node: &Node, policy: &LayerPolicy) -> Option<curation_graph::Scalar> {
        policy
            .position_feature
            .as_deref()
            .and_then(|f| node.attribute(f))
            .and_then(Value::as_scalar)
            .cloned()
    }

    fn reject_duplicate(
        &self,
        source: &AnnotationGraph,
        node: &Node,
        policy: &LayerPolicy,
        curator: &AnnotationGraph,
        position: &Position,
    ) -> Result<(), MergeError> {
        let indexer = self.indexer();
        let curator_id = AnnotatorId::curator();
        let wanted = Fingerprint::of_node(&indexer, source, node, policy, &curator_id);
        for handle in indexer.nodes_at(curator, position)? {
            let existing = curator.node(handle)?;
            if Fingerprint::of_node(&indexer, curator, existing, policy, &curator_id) == wanted {
                return Err(MergeError::AlreadyExists(position.clone()));
            }
        }
        Ok(())
    }
}

/// Null references to a node removed after the attributes were copied
fn forget_handle(attributes: &mut IndexMap<String, Value>, removed: NodeHandle) {
    for value in attributes.values_mut() {
        match value {
            Value::Ref(target) if *target == Some(removed) => *target = None,
            Value::Links(links) => links.retain(|l| l.target != Some(removed)),
            _ => {}
        }
    }
}

fn same_endpoints(
    curator: &AnnotationGraph,
    handle: NodeHandle,
    policy: &LayerPolicy,
    endpoints: Option<(NodeHandle, NodeHandle)>,
) -> bool {
    let (Some((s, t)), Some((src, tgt))) = (policy.endpoints(), endpoints) else {
        return true;
    };
    curator.get(handle).is_some_and(|n| {
        n.attribute(s).and_then(Value::as_ref_handle) == Some(src)
            && n.attribute(t).and_then(Value::as_ref_handle) == Some(tgt)
    })
}
