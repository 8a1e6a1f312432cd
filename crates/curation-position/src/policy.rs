//! Layer and feature policies
//!
//! Per annotation type, the policy table says which attributes take part in
//! value comparison, which attribute (if any) discriminates positions,
//! whether the type is relation-shaped, how link arrays are compared, and
//! whether stacking is permitted in the curator graph.

use crate::error::IndexError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// How elements of a link array are aligned and compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkCompareMode {
    /// Slots are keyed by role; the filler's position is the compared value
    ByTarget,

    /// Slots are keyed by the filler's position; the role is the compared value
    #[default]
    ByRole,

    /// Slots are keyed by role and filler; only presence is compared
    ByBoth,
}

/// Link array feature declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkFeature {
    /// Attribute name holding the link array
    pub name: String,

    /// Comparison mode
    #[serde(default)]
    pub mode: LinkCompareMode,

    /// Whether the array is diffed and merged element-wise
    #[serde(default = "default_true")]
    pub diff: bool,
}

fn default_true() -> bool {
    true
}

impl LinkFeature {
    /// Create diff-relevant link feature
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, mode: LinkCompareMode) -> Self {
        Self {
            name: name.into(),
            mode,
            diff: true,
        }
    }
}

/// Shape of a layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayerKind {
    /// Plain span annotation
    Span,

    /// Relation between two nodes
    Relation {
        /// Attribute holding the source endpoint
        source: String,
        /// Attribute holding the target endpoint
        target: String,
    },
}

/// Policy for one annotation type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerPolicy {
    /// Annotation type name
    #[serde(rename = "type")]
    pub type_name: String,

    /// Layer shape
    #[serde(flatten)]
    pub kind: LayerKind,

    /// Attributes compared for agreement
    #[serde(default)]
    pub compared: Vec<String>,

    /// Attribute whose value is part of the position
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_feature: Option<String>,

    /// Link array features
    #[serde(default)]
    pub links: Vec<LinkFeature>,

    /// Several nodes may coexist at one position in the curator graph
    #[serde(default)]
    pub allow_stacking: bool,
}

impl LayerPolicy {
    /// Span layer with no compared attributes
    #[must_use]
    pub fn span(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            kind: LayerKind::Span,
            compared: Vec::new(),
            position_feature: None,
            links: Vec::new(),
            allow_stacking: false,
        }
    }

    /// Relation layer with the given endpoint attributes
    #[must_use]
    pub fn relation(
        type_name: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            kind: LayerKind::Relation {
                source: source.into(),
                target: target.into(),
            },
            ..Self::span(type_name)
        }
    }

    /// Add a compared attribute
    #[inline]
    #[must_use]
    pub fn compare(mut self, attribute: impl Into<String>) -> Self {
        self.compared.push(attribute.into());
        self
    }

    /// Set the position-discriminating attribute
    #[inline]
    #[must_use]
    pub fn with_position_feature(mut self, attribute: impl Into<String>) -> Self {
        self.position_feature = Some(attribute.into());
        self
    }

    /// Add a link array feature
    #[inline]
    #[must_use]
    pub fn with_link(mut self, name: impl Into<String>, mode: LinkCompareMode) -> Self {
        self.links.push(LinkFeature::new(name, mode));
        self
    }

    /// Permit stacking in the curator graph
    #[inline]
    #[must_use]
    pub fn with_stacking(mut self, allow: bool) -> Self {
        self.allow_stacking = allow;
        self
    }

    /// Check if the layer is relation-shaped
    #[inline]
    #[must_use]
    pub fn is_relation(&self) -> bool {
        matches!(self.kind, LayerKind::Relation { .. })
    }

    /// Source and target attribute names, for relation layers
    #[inline]
    #[must_use]
    pub fn endpoints(&self) -> Option<(&str, &str)> {
        match &self.kind {
            LayerKind::Relation { source, target } => Some((source, target)),
            LayerKind::Span => None,
        }
    }

    /// Link feature declaration by name
    #[inline]
    #[must_use]
    pub fn link(&self, name: &str) -> Option<&LinkFeature> {
        self.links.iter().find(|l| l.name == name)
    }

    /// Link features that are diffed element-wise
    pub fn diff_links(&self) -> impl Iterator<Item = &LinkFeature> {
        self.links.iter().filter(|l| l.diff)
    }

    /// Check if an attribute is a declared link feature
    #[inline]
    #[must_use]
    pub fn is_link(&self, attribute: &str) -> bool {
        self.link(attribute).is_some()
    }

    /// Check if an attribute is a relation endpoint
    #[inline]
    #[must_use]
    pub fn is_endpoint(&self, attribute: &str) -> bool {
        self.endpoints()
            .is_some_and(|(s, t)| s == attribute || t == attribute)
    }
}

/// Policy lookup table keyed by type name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<LayerPolicy>", into = "Vec<LayerPolicy>")]
pub struct PolicyTable {
    layers: IndexMap<String, LayerPolicy>,
}

impl PolicyTable {
    /// Create empty table
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert policy, replacing any previous policy for the same type
    pub fn insert(&mut self, policy: LayerPolicy) -> Option<LayerPolicy> {
        self.layers.insert(policy.type_name.clone(), policy)
    }

    /// Chainable insert
    #[inline]
    #[must_use]
    pub fn with(mut self, policy: LayerPolicy) -> Self {
        self.insert(policy);
        self
    }

    /// Policy by type name
    #[inline]
    #[must_use]
    pub fn get(&self, type_name: &str) -> Option<&LayerPolicy> {
        self.layers.get(type_name)
    }

    /// Policy by type name, failing when absent
    ///
    /// # Errors
    /// `UnknownType`
    pub fn require(&self, type_name: &str) -> Result<&LayerPolicy, IndexError> {
        self.get(type_name)
            .ok_or_else(|| IndexError::UnknownType(type_name.to_string()))
    }

    /// Check if a type has a policy
    #[inline]
    #[must_use]
    pub fn contains(&self, type_name: &str) -> bool {
        self.layers.contains_key(type_name)
    }

    /// Number of policies
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Check if table is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Iterate policies in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &LayerPolicy> {
        self.layers.values()
    }

    /// All type names in insertion order
    #[must_use]
    pub fn type_names(&self) -> Vec<String> {
        self.layers.keys().cloned().collect()
    }
}

impl From<Vec<LayerPolicy>> for PolicyTable {
    fn from(layers: Vec<LayerPolicy>) -> Self {
        layers.into_iter().fold(Self::new(), Self::with)
    }
}

impl From<PolicyTable> for Vec<LayerPolicy> {
    fn from(table: PolicyTable) -> Self {
        table.layers.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relation_policy_endpoints() {
        let p = LayerPolicy::relation("Dependency", "governor", "dependent").compare("label");
        assert!(p.is_relation());
        assert_eq!(p.endpoints(), Some(("governor", "dependent")));
        assert!(p.is_endpoint("governor"));
        assert!(!p.is_endpoint("label"));
        assert_eq!(p.compared, vec!["label".to_string()]);
    }

    #[test]
    fn link_lookup_and_diff_filter() {
        let mut p = LayerPolicy::span("Event").with_link("args", LinkCompareMode::ByRole);
        p.links.push(LinkFeature {
            name: "notes".into(),
            mode: LinkCompareMode::ByBoth,
            diff: false,
        });

        assert!(p.is_link("args"));
        assert!(p.is_link("notes"));
        let diffed: Vec<_> = p.diff_links().map(|l| l.name.as_str()).collect();
        assert_eq!(diffed, vec!["args"]);
    }

    #[test]
    fn table_require_unknown() {
        let table = PolicyTable::new().with(LayerPolicy::span("POS"));
        assert!(table.require("POS").is_ok());
        assert!(matches!(
            table.require("Lemma"),
            Err(IndexError::UnknownType(t)) if t == "Lemma"
        ));
    }

    #[test]
    fn table_from_toml() {
        #[derive(Deserialize)]
        struct Doc {
            layers: PolicyTable,
        }

        let doc: Doc = toml::from_str(
            r#"
            [[layers]]
            type = "POS"
            kind = "span"
            compared = ["value"]

            [[layers]]
            type = "Dependency"
            kind = "relation"
            source = "governor"
            target = "dependent"
            compared = ["label"]
            allow_stacking = true

            [[layers]]
            type = "Event"
            kind = "span"
            links = [{ name = "args", mode = "by_target" }]
            "#,
        )
        .unwrap();

        assert_eq!(doc.layers.len(), 3);
        let dep = doc.layers.get("Dependency").unwrap();
        assert_eq!(dep.endpoints(), Some(("governor", "dependent")));
        assert!(dep.allow_stacking);

        let event = doc.layers.get("Event").unwrap();
        let args = event.link("args").unwrap();
        assert_eq!(args.mode, LinkCompareMode::ByTarget);
        assert!(args.diff);
    }
}
