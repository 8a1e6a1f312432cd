//! Configurations and configuration sets
//!
//! A [`ConfigurationSet`] gathers everything observed at one [`Position`]
//! across all graphs; its [`Configuration`]s partition those observations
//! by [`Fingerprint`].

use crate::annotator::AnnotatorId;
use crate::fingerprint::Fingerprint;
use curation_graph::NodeHandle;
use curation_position::Position;
use serde::Serialize;
use smallvec::SmallVec;
use std::collections::BTreeSet;

/// Location of a link element within its host
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SlotRef {
    /// Link feature name
    pub feature: String,
    /// Element index in the host's array
    pub index: usize,
    /// Filler node
    pub target: NodeHandle,
}

/// One annotator's observation at a position
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigurationItem {
    /// Owner of the observation
    pub annotator: AnnotatorId,
    /// Annotation node (the host, for slot items)
    pub node: NodeHandle,
    /// Link element, for slot items
    pub slot: Option<SlotRef>,
}

impl ConfigurationItem {
    /// Item for an annotation node
    #[inline]
    #[must_use]
    pub fn node(annotator: AnnotatorId, node: NodeHandle) -> Self {
        Self {
            annotator,
            node,
            slot: None,
        }
    }

    /// Item for a link element
    #[inline]
    #[must_use]
    pub fn slot(annotator: AnnotatorId, host: NodeHandle, slot: SlotRef) -> Self {
        Self {
            annotator,
            node: host,
            slot: Some(slot),
        }
    }
}

/// Items at one position sharing a fingerprint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    fingerprint: Fingerprint,
    items: SmallVec<[ConfigurationItem; 4]>,
}

impl Configuration {
    pub(crate) fn new(fingerprint: Fingerprint) -> Self {
        Self {
            fingerprint,
            items: SmallVec::new(),
        }
    }

    pub(crate) fn push(&mut self, item: ConfigurationItem) {
        self.items.push(item);
    }

    /// Shared fingerprint
    #[inline]
    #[must_use]
    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    /// Items in contribution order
    #[inline]
    #[must_use]
    pub fn items(&self) -> &[ConfigurationItem] {
        &self.items
    }

    /// Annotators contributing to this configuration
    #[must_use]
    pub fn annotators(&self) -> BTreeSet<&AnnotatorId> {
        self.items.iter().map(|i| &i.annotator).collect()
    }

    /// Check if an annotator contributed to this configuration
    #[inline]
    #[must_use]
    pub fn contains(&self, annotator: &AnnotatorId) -> bool {
        self.items.iter().any(|i| &i.annotator == annotator)
    }

    /// First item contributed by `annotator`
    #[must_use]
    pub fn item_for(&self, annotator: &AnnotatorId) -> Option<&ConfigurationItem> {
        self.items.iter().find(|i| &i.annotator == annotator)
    }
}

/// Summary row of a configuration for reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigurationView {
    /// Rendered fingerprint
    pub value: String,
    /// Contributing annotators
    pub annotators: Vec<String>,
}

/// All configurations observed at one position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationSet {
    position: Position,
    configurations: Vec<Configuration>,
    non_comparable: bool,
}

impl ConfigurationSet {
    /// Create empty set
    #[inline]
    #[must_use]
    pub fn new(position: Position) -> Self {
        Self {
            position,
            configurations: Vec::new(),
            non_comparable: false,
        }
    }

    /// Add an item, joining the configuration with an equal fingerprint
    ///
    /// Configurations keep first-seen order.
    pub fn add(&mut self, fingerprint: Fingerprint, item: ConfigurationItem) {
        if !fingerprint.is_comparable() {
            self.non_comparable = true;
        }
        match self
            .configurations
            .iter_mut()
            .find(|c| c.fingerprint == fingerprint)
        {
            Some(config) => config.push(item),
            None => {
                let mut config = Configuration::new(fingerprint);
                config.push(item);
                self.configurations.push(config);
            }
        }
    }

    /// Position of the set
    #[inline]
    #[must_use]
    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Configurations in first-seen order
    #[inline]
    #[must_use]
    pub fn configurations(&self) -> &[Configuration] {
        &self.configurations
    }

    /// Check if an item could not be compared
    #[inline]
    #[must_use]
    pub fn is_non_comparable(&self) -> bool {
        self.non_comparable
    }

    /// Check if this set describes a link slot
    #[inline]
    #[must_use]
    pub fn is_slot(&self) -> bool {
        self.position.is_slot()
    }

    /// All items in configuration order
    pub fn items(&self) -> impl Iterator<Item = &ConfigurationItem> {
        self.configurations.iter().flat_map(|c| c.items.iter())
    }

    /// Items contributed by one annotator
    #[must_use]
    pub fn items_of(&self, annotator: &AnnotatorId) -> Vec<&ConfigurationItem> {
        self.items().filter(|i| &i.annotator == annotator).collect()
    }

    /// Number of items contributed by one annotator
    #[must_use]
    pub fn count_of(&self, annotator: &AnnotatorId) -> usize {
        self.items().filter(|i| &i.annotator == annotator).count()
    }

    /// Configuration containing the annotator's first item
    #[must_use]
    pub fn configuration_of(&self, annotator: &AnnotatorId) -> Option<&Configuration> {
        self.configurations.iter().find(|c| c.contains(annotator))
    }

    /// Every annotator with at least one item, curator included
    #[must_use]
    pub fn annotators(&self) -> BTreeSet<&AnnotatorId> {
        self.items().map(|i| &i.annotator).collect()
    }

    /// Check if only the curator contributed
    #[must_use]
    pub fn is_curator_only(&self) -> bool {
        self.items().all(|i| i.annotator.is_curator())
    }

    /// Reporting view of the configurations
    #[must_use]
    pub fn views(&self) -> Vec<ConfigurationView> {
        self.configurations
            .iter()
            .map(|c| ConfigurationView {
                value: c.fingerprint.to_string(),
                annotators: c.annotators().into_iter().map(ToString::to_string).collect(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::FeatureKey;
    use curation_graph::{AnnotationGraph, Scalar};

    fn fp(v: &str) -> Fingerprint {
        Fingerprint::Values(vec![("value".into(), FeatureKey::Scalar(Scalar::Str(v.into())))])
    }

    #[test]
    fn add_partitions_by_fingerprint() {
        let mut g = AnnotationGraph::new();
        let n1 = g.build("POS", 0, 1).insert().unwrap();
        let n2 = g.build("POS", 0, 1).insert().unwrap();
        let n3 = g.build("POS", 0, 1).insert().unwrap();

        let mut set = ConfigurationSet::new(Position::span("POS", 0, 1));
        set.add(fp("NN"), ConfigurationItem::node("a".into(), n1));
        set.add(fp("VB"), ConfigurationItem::node("b".into(), n2));
        set.add(fp("NN"), ConfigurationItem::node("c".into(), n3));

        assert_eq!(set.configurations().len(), 2);
        assert_eq!(set.configurations()[0].items().len(), 2);
        assert_eq!(set.count_of(&"a".into()), 1);
        assert!(set.configuration_of(&"c".into()).unwrap().contains(&"a".into()));
        assert!(!set.is_non_comparable());
        assert!(!set.is_curator_only());
    }

    #[test]
    fn non_comparable_items_flag_the_set() {
        let mut g = AnnotationGraph::new();
        let n = g.build("POS", 0, 1).insert().unwrap();
        let mut set = ConfigurationSet::new(Position::span("POS", 0, 1));
        set.add(
            Fingerprint::NonComparable {
                annotator: "a".into(),
                node: n,
            },
            ConfigurationItem::node("a".into(), n),
        );
        assert!(set.is_non_comparable());
    }
}
