//! Agreement classification
//!
//! Exact agreement only: there is no voting, and a majority never wins.

use crate::annotator::AnnotatorId;
use crate::configuration::ConfigurationSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};

/// Agreement status of a configuration set
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Agreement {
    /// Every considered annotator contributed exactly one item, all equal
    Agree,
    /// Stacking, differing values, or items that could not be compared
    Disagree,
    /// Some considered annotator contributed nothing; the rest agree
    Incomplete,
}

impl Agreement {
    /// Check for `Agree`
    #[inline]
    #[must_use]
    pub fn is_agree(self) -> bool {
        self == Self::Agree
    }

    /// Check if the set may be merged, given the incomplete-merge switch
    #[inline]
    #[must_use]
    pub fn is_mergeable(self, merge_incomplete: bool) -> bool {
        match self {
            Self::Agree => true,
            Self::Incomplete => merge_incomplete,
            Self::Disagree => false,
        }
    }
}

impl Display for Agreement {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Agree => "AGREE",
            Self::Disagree => "DISAGREE",
            Self::Incomplete => "INCOMPLETE",
        })
    }
}

/// Classify a configuration set over the considered annotators
///
/// Disagreement takes precedence over incompleteness: a set where one
/// annotator is missing and the others differ is `Disagree`. Only items of
/// considered annotators count, including items that could not be compared.
#[must_use]
pub fn classify(set: &ConfigurationSet, annotators: &BTreeSet<AnnotatorId>) -> Agreement {
    let considered_non_comparable = set
        .configurations()
        .iter()
        .any(|c| !c.fingerprint().is_comparable() && annotators.iter().any(|a| c.contains(a)));
    if considered_non_comparable {
        return Agreement::Disagree;
    }

    let mut missing = false;
    for annotator in annotators {
        match set.count_of(annotator) {
            0 => missing = true,
            1 => {}
            _ => return Agreement::Disagree,
        }
    }

    let classes = set
        .configurations()
        .iter()
        .filter(|c| annotators.iter().any(|a| c.contains(a)))
        .count();
    if classes > 1 {
        return Agreement::Disagree;
    }

    if missing {
        Agreement::Incomplete
    } else {
        Agreement::Agree
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::ConfigurationItem;
    use crate::fingerprint::{FeatureKey, Fingerprint};
    use curation_graph::{AnnotationGraph, Scalar};
    use curation_position::Position;

    fn fp(v: &str) -> Fingerprint {
        Fingerprint::Values(vec![("value".into(), FeatureKey::Scalar(Scalar::Str(v.into())))])
    }

    fn set_of(entries: &[(&str, &str)]) -> ConfigurationSet {
        let mut g = AnnotationGraph::new();
        let mut set = ConfigurationSet::new(Position::span("POS", 0, 1));
        for (annotator, value) in entries {
            let h = g.build("POS", 0, 1).insert().unwrap();
            set.add(fp(value), ConfigurationItem::node((*annotator).into(), h));
        }
        set
    }

    fn ids(names: &[&str]) -> BTreeSet<AnnotatorId> {
        names.iter().map(|n| AnnotatorId::from(*n)).collect()
    }

    #[test]
    fn all_equal_agrees() {
        let set = set_of(&[("a", "NN"), ("b", "NN")]);
        assert_eq!(classify(&set, &ids(&["a", "b"])), Agreement::Agree);
    }

    #[test]
    fn differing_values_disagree() {
        let set = set_of(&[("a", "NN"), ("b", "VB")]);
        assert_eq!(classify(&set, &ids(&["a", "b"])), Agreement::Disagree);
    }

    #[test]
    fn missing_annotator_is_incomplete() {
        let set = set_of(&[("a", "NN")]);
        assert_eq!(classify(&set, &ids(&["a", "b"])), Agreement::Incomplete);
    }

    #[test]
    fn stacking_disagrees_even_with_equal_values() {
        let set = set_of(&[("a", "NN"), ("a", "NN"), ("b", "NN")]);
        assert_eq!(classify(&set, &ids(&["a", "b"])), Agreement::Disagree);
    }

    #[test]
    fn disagreement_wins_over_incompleteness() {
        let set = set_of(&[("a", "NN"), ("b", "VB")]);
        assert_eq!(classify(&set, &ids(&["a", "b", "c"])), Agreement::Disagree);
    }

    #[test]
    fn curator_is_ignored_unless_considered() {
        let set = set_of(&[("a", "NN"), ("b", "NN"), ("CURATOR", "VB")]);
        assert_eq!(classify(&set, &ids(&["a", "b"])), Agreement::Agree);
        assert_eq!(
            classify(&set, &ids(&["a", "b", "CURATOR"])),
            Agreement::Disagree
        );
    }

    #[test]
    fn non_comparable_item_disagrees_only_when_considered() {
        let mut g = AnnotationGraph::new();
        let mut set = set_of(&[("a", "NN"), ("b", "NN")]);
        let h = g.build("POS", 0, 1).insert().unwrap();
        set.add(
            Fingerprint::NonComparable {
                annotator: AnnotatorId::curator(),
                node: h,
            },
            ConfigurationItem::node(AnnotatorId::curator(), h),
        );
        assert!(set.is_non_comparable());
        assert_eq!(classify(&set, &ids(&["a", "b"])), Agreement::Agree);

        let h = g.build("POS", 0, 1).insert().unwrap();
        let mut set = set_of(&[("b", "NN")]);
        set.add(
            Fingerprint::NonComparable {
                annotator: "a".into(),
                node: h,
            },
            ConfigurationItem::node("a".into(), h),
        );
        assert_eq!(classify(&set, &ids(&["a", "b"])), Agreement::Disagree);
    }

    #[test]
    fn mergeable_respects_switch() {
        assert!(Agreement::Agree.is_mergeable(false));
        assert!(!Agreement::Incomplete.is_mergeable(false));
        assert!(Agreement::Incomplete.is_mergeable(true));
        assert!(!Agreement::Disagree.is_mergeable(true));
    }
}
