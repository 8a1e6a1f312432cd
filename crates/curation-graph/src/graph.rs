//! Annotation graph arena
//!
//! Provides [`AnnotationGraph`], one annotator's markup over one document,
//! stored as an arena of [`Node`]s addressed by [`NodeHandle`]s.

use crate::error::GraphError;
use crate::handle::{GraphId, NodeHandle};
use crate::value::{Link, Value};
use indexmap::IndexMap;
use std::collections::{BTreeMap, BTreeSet};

/// One annotation
///
/// # Invariants
/// - `begin <= end`
/// - every handle in `attributes` names a live node of the owning graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    handle: NodeHandle,
    type_name: String,
    begin: usize,
    end: usize,
    attributes: IndexMap<String, Value>,
}

impl Node {
    /// Node handle (graph id + local id)
    #[inline]
    #[must_use]
    pub fn handle(&self) -> NodeHandle {
        self.handle
    }

    /// Annotation type name
    #[inline]
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Begin offset
    #[inline]
    #[must_use]
    pub fn begin(&self) -> usize {
        self.begin
    }

    /// End offset
    #[inline]
    #[must_use]
    pub fn end(&self) -> usize {
        self.end
    }

    /// Attribute by name
    #[inline]
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// All attributes in insertion order
    #[inline]
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Link array attribute, empty when absent or not a link array
    #[inline]
    #[must_use]
    pub fn links(&self, name: &str) -> &[Link] {
        self.attribute(name)
            .and_then(Value::as_links)
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Result of removing a node
#[derive(Debug, Clone)]
pub struct Removal {
    /// The removed node
    pub node: Node,

    /// Nodes whose link arrays lost an element pointing at the removed node
    pub pruned_links: Vec<NodeHandle>,

    /// Nodes whose reference attributes were nulled
    pub detached: Vec<NodeHandle>,
}

/// Arena-backed annotation graph
///
/// Cloning produces an independent copy that keeps the same [`GraphId`],
/// so handles remain valid in both copies.
#[derive(Debug, Clone)]
pub struct AnnotationGraph {
    id: GraphId,
    slots: Vec<Slot>,
    free: Vec<u32>,
    by_type: BTreeMap<String, BTreeSet<u32>>,
    len: usize,
}

impl Default for AnnotationGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl AnnotationGraph {
    /// Create empty graph with a fresh id
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: GraphId::next(),
            slots: Vec::new(),
            free: Vec::new(),
            by_type: BTreeMap::new(),
            len: 0,
        }
    }

    /// Graph identity
    #[inline]
    #[must_use]
    pub fn id(&self) -> GraphId {
        self.id
    }

    /// Number of live nodes
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if graph has no nodes
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Verify a handle is live and owned by this graph
    ///
    /// # Errors
    /// `ForeignHandle` or `InvalidHandle`
    pub fn check(&self, handle: NodeHandle) -> Result<(), GraphError> {
        if handle.graph() != self.id {
            return Err(GraphError::ForeignHandle {
                handle,
                owner: handle.graph(),
                graph: self.id,
            });
        }
        match self.slots.get(handle.index() as usize) {
            Some(slot) if slot.generation == handle.generation() && slot.node.is_some() => Ok(()),
            _ => Err(GraphError::InvalidHandle(handle)),
        }
    }

    /// Check if a handle names a live node of this graph
    #[inline]
    #[must_use]
    pub fn contains(&self, handle: NodeHandle) -> bool {
        self.check(handle).is_ok()
    }

    /// Lookup node
    #[must_use]
    pub fn get(&self, handle: NodeHandle) -> Option<&Node> {
        if handle.graph() != self.id {
            return None;
        }
        let slot = self.slots.get(handle.index() as usize)?;
        if slot.generation != handle.generation() {
            return None;
        }
        slot.node.as_ref()
    }

    /// Lookup node, failing on a stale or foreign handle
    ///
    /// # Errors
    /// See [`AnnotationGraph::check`]
    pub fn node(&self, handle: NodeHandle) -> Result<&Node, GraphError> {
        self.check(handle)?;
        self.get(handle).ok_or(GraphError::InvalidHandle(handle))
    }

    /// Resolve an optional reference to a live node
    #[inline]
    #[must_use]
    pub fn resolve(&self, handle: Option<NodeHandle>) -> Option<&Node> {
        handle.and_then(|h| self.get(h))
    }

    /// Iterate live nodes in arena order
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.slots.iter().filter_map(|s| s.node.as_ref())
    }

    /// Handles of all live nodes in arena order
    #[must_use]
    pub fn handles(&self) -> Vec<NodeHandle> {
        self.iter().map(Node::handle).collect()
    }

    /// Iterate live nodes of one type in arena order
    pub fn nodes_of_type<'a>(&'a self, type_name: &str) -> impl Iterator<Item = &'a Node> + 'a {
        self.by_type
            .get(type_name)
            .into_iter()
            .flat_map(|set| set.iter())
            .filter_map(move |&i| self.slots[i as usize].node.as_ref())
    }

    /// Type names with at least one live node
    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.by_type
            .iter()
            .filter(|(_, set)| !set.is_empty())
            .map(|(t, _)| t.as_str())
    }

    /// Nodes of `type_name` spanning exactly `begin..end`
    #[must_use]
    pub fn select_at(&self, type_name: &str, begin: usize, end: usize) -> Vec<NodeHandle> {
        self.nodes_of_type(type_name)
            .filter(|n| n.begin == begin && n.end == end)
            .map(Node::handle)
            .collect()
    }

    /// Start building a node
    #[inline]
    #[must_use]
    pub fn build(&mut self, type_name: impl Into<String>, begin: usize, end: usize) -> NodeBuilder<'_> {
        NodeBuilder {
            graph: self,
            type_name: type_name.into(),
            begin,
            end,
            attributes: IndexMap::new(),
        }
    }

    /// Insert a node with the given attributes
    ///
    /// # Errors
    /// `InvalidOffsets` if `begin > end`; a handle error if an attribute
    /// references a node that is not live in this graph
    pub fn insert(
        &mut self,
        type_name: impl Into<String>,
        begin: usize,
        end: usize,
        attributes: IndexMap<String, Value>,
    ) -> Result<NodeHandle, GraphError> {
        if begin > end {
            return Err(GraphError::InvalidOffsets { begin, end });
        }
        for value in attributes.values() {
            self.check_value(value)?;
        }

        let type_name = type_name.into();
        let index = match self.free.pop() {
            Some(i) => i,
            None => {
                let i = u32::try_from(self.slots.len()).map_err(|_| GraphError::CapacityExceeded)?;
                self.slots.push(Slot {
                    generation: 0,
                    node: None,
                });
                i
            }
        };

        let slot = &mut self.slots[index as usize];
        let handle = NodeHandle::new(self.id, index, slot.generation);
        slot.node = Some(Node {
            handle,
            type_name: type_name.clone(),
            begin,
            end,
            attributes,
        });
        self.by_type.entry(type_name).or_default().insert(index);
        self.len += 1;
        Ok(handle)
    }

    /// Set (or replace) an attribute, returning the previous value
    ///
    /// # Errors
    /// Handle errors for `handle` or for any handle inside `value`
    pub fn set_attribute(
        &mut self,
        handle: NodeHandle,
        name: impl Into<String>,
        value: Value,
    ) -> Result<Option<Value>, GraphError> {
        self.check(handle)?;
        self.check_value(&value)?;
        let node = self.node_mut(handle)?;
        Ok(node.attributes.insert(name.into(), value))
    }

    /// Remove a node
    ///
    /// Every link element pointing at the removed node is filtered out of
    /// its array and every reference attribute pointing at it is nulled.
    /// The affected nodes are reported in the returned [`Removal`].
    ///
    /// # Errors
    /// Handle errors for `handle`
    pub fn remove(&mut self, handle: NodeHandle) -> Result<Removal, GraphError> {
        self.check(handle)?;
        let slot = &mut self.slots[handle.index() as usize];
        let node = slot.node.take().ok_or(GraphError::InvalidHandle(handle))?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index());
        self.len -= 1;
        if let Some(set) = self.by_type.get_mut(&node.type_name) {
            set.remove(&handle.index());
        }

        let mut pruned_links = Vec::new();
        let mut detached = Vec::new();
        for other in self.slots.iter_mut().filter_map(|s| s.node.as_mut()) {
            let mut pruned = false;
            let mut nulled = false;
            for value in other.attributes.values_mut() {
                match value {
                    Value::Ref(target) if *target == Some(handle) => {
                        *target = None;
                        nulled = true;
                    }
                    Value::Links(links) => {
                        let before = links.len();
                        links.retain(|l| l.target != Some(handle));
                        pruned |= links.len() != before;
                    }
                    _ => {}
                }
            }
            if pruned {
                pruned_links.push(other.handle);
            }
            if nulled {
                detached.push(other.handle);
            }
        }

        Ok(Removal {
            node,
            pruned_links,
            detached,
        })
    }

    /// Remove every node whose type is in `types`
    ///
    /// Returns the number of removed nodes.
    pub fn clear_types<S: AsRef<str>>(&mut self, types: &[S]) -> usize {
        let doomed: Vec<NodeHandle> = types
            .iter()
            .flat_map(|t| self.nodes_of_type(t.as_ref()).map(Node::handle).collect::<Vec<_>>())
            .collect();
        doomed
            .into_iter()
            .filter(|&h| self.remove(h).is_ok())
            .count()
    }

    fn node_mut(&mut self, handle: NodeHandle) -> Result<&mut Node, GraphError> {
        self.slots
            .get_mut(handle.index() as usize)
            .filter(|s| s.generation == handle.generation())
            .and_then(|s| s.node.as_mut())
            .ok_or(GraphError::InvalidHandle(handle))
    }

    fn check_value(&self, value: &Value) -> Result<(), GraphError> {
        value.referenced().try_for_each(|h| self.check(h))
    }
}

/// Builder for inserting a node
#[derive(Debug)]
pub struct NodeBuilder<'g> {
    graph: &'g mut AnnotationGraph,
    type_name: String,
    begin: usize,
    end: usize,
    attributes: IndexMap<String, Value>,
}

impl NodeBuilder<'_> {
    /// Set attribute
    #[inline]
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Append an element to a link array attribute
    #[must_use]
    pub fn link(mut self, name: impl Into<String>, role: impl Into<String>, target: NodeHandle) -> Self {
        let entry = self
            .attributes
            .entry(name.into())
            .or_insert_with(|| Value::Links(Vec::new()));
        if !matches!(entry, Value::Links(_)) {
            *entry = Value::Links(Vec::new());
        }
        if let Value::Links(links) = entry {
            links.push(Link::new(role, target));
        }
        self
    }

    /// Insert the node
    ///
    /// # Errors
    /// See [`AnnotationGraph::insert`]
    pub fn insert(self) -> Result<NodeHandle, GraphError> {
        self.graph
            .insert(self.type_name, self.begin, self.end, self.attributes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Scalar;

    #[test]
    fn insert_and_lookup() {
        let mut g = AnnotationGraph::new();
        let h = g.build("POS", 0, 4).attr("value", "NN").insert().unwrap();

        let node = g.node(h).unwrap();
        assert_eq!(node.type_name(), "POS");
        assert_eq!((node.begin(), node.end()), (0, 4));
        assert_eq!(
            node.attribute("value"),
            Some(&Value::Scalar(Scalar::Str("NN".into())))
        );
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn rejects_inverted_offsets() {
        let mut g = AnnotationGraph::new();
        let result = g.build("POS", 5, 4).insert();
        assert_eq!(result, Err(GraphError::InvalidOffsets { begin: 5, end: 4 }));
    }

    #[test]
    fn rejects_foreign_reference() {
        let mut a = AnnotationGraph::new();
        let mut b = AnnotationGraph::new();
        let ha = a.build("Token", 0, 1).insert().unwrap();

        let result = b.build("Dep", 0, 1).attr("governor", ha).insert();
        assert!(matches!(result, Err(GraphError::ForeignHandle { .. })));
    }

    #[test]
    fn removal_invalidates_handle_and_reuses_slot() {
        let mut g = AnnotationGraph::new();
        let h = g.build("Token", 0, 1).insert().unwrap();
        g.remove(h).unwrap();

        assert!(!g.contains(h));
        assert_eq!(g.check(h), Err(GraphError::InvalidHandle(h)));

        let h2 = g.build("Token", 2, 3).insert().unwrap();
        assert_eq!(h2.index(), h.index());
        assert_ne!(h2, h);
        assert!(g.get(h).is_none());
    }

    #[test]
    fn removal_filters_link_arrays_and_nulls_refs() {
        let mut g = AnnotationGraph::new();
        let t1 = g.build("Token", 0, 1).insert().unwrap();
        let t2 = g.build("Token", 2, 3).insert().unwrap();
        let dep = g
            .build("Dependency", 2, 3)
            .attr("governor", t1)
            .attr("dependent", t2)
            .insert()
            .unwrap();
        let host = g
            .build("Event", 0, 3)
            .link("args", "agent", t1)
            .link("args", "theme", t2)
            .insert()
            .unwrap();

        let removal = g.remove(t1).unwrap();
        assert_eq!(removal.detached, vec![dep]);
        assert_eq!(removal.pruned_links, vec![host]);

        let links = g.node(host).unwrap().links("args");
        assert_eq!(links, &[Link::new("theme", t2)]);
        assert_eq!(g.node(dep).unwrap().attribute("governor"), Some(&Value::Ref(None)));
    }

    #[test]
    fn select_at_and_types() {
        let mut g = AnnotationGraph::new();
        let a = g.build("NamedEntity", 0, 0).attr("value", "PER").insert().unwrap();
        let b = g.build("NamedEntity", 0, 0).attr("value", "PER").insert().unwrap();
        g.build("POS", 0, 4).insert().unwrap();

        assert_eq!(g.select_at("NamedEntity", 0, 0), vec![a, b]);
        assert!(g.select_at("NamedEntity", 0, 1).is_empty());
        assert_eq!(g.types().collect::<Vec<_>>(), vec!["NamedEntity", "POS"]);
    }

    #[test]
    fn clear_types_removes_only_listed_types() {
        let mut g = AnnotationGraph::new();
        g.build("POS", 0, 4).insert().unwrap();
        g.build("POS", 5, 8).insert().unwrap();
        let keep = g.build("Lemma", 0, 4).insert().unwrap();

        assert_eq!(g.clear_types(&["POS"]), 2);
        assert_eq!(g.handles(), vec![keep]);
    }

    #[test]
    fn set_attribute_returns_previous() {
        let mut g = AnnotationGraph::new();
        let h = g.build("POS", 0, 4).attr("value", "NN").insert().unwrap();
        let prev = g.set_attribute(h, "value", Value::from("VB")).unwrap();
        assert_eq!(prev, Some(Value::from("NN")));
        assert_eq!(g.node(h).unwrap().attribute("value"), Some(&Value::from("VB")));
    }
}
