//! Position keys
//!
//! A [`Position`] identifies *where* an annotation sits independently of the
//! node that carries it and of its non-discriminating values, so that nodes
//! made by different annotators can be aligned. Positions are totally
//! ordered: begin offset first, then type name, then the remaining fields.

use curation_graph::Scalar;
use serde::{Serialize, Serializer};
use std::fmt::{self, Display, Formatter};

/// Positions of a relation's two endpoints
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Endpoints {
    /// Source endpoint position
    pub source: Position,
    /// Target endpoint position
    pub target: Position,
}

/// Link slot coordinates within a host annotation
///
/// Which of `role` and `target` is set depends on the link feature's
/// [`LinkCompareMode`](crate::LinkCompareMode).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotKey {
    /// Link feature name
    pub feature: String,
    /// Role label, when part of the key
    pub role: Option<String>,
    /// Filler position, when part of the key
    pub target: Option<Position>,
}

/// Alignment key for annotations and link slots
///
/// Field order matters: the derived ordering sorts by begin offset, then
/// type name, then end offset.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    begin: usize,
    type_name: String,
    end: usize,
    discriminant: Option<Scalar>,
    endpoints: Option<Box<Endpoints>>,
    slot: Option<Box<SlotKey>>,
}

impl Position {
    /// Span position
    #[must_use]
    pub fn span(type_name: impl Into<String>, begin: usize, end: usize) -> Self {
        Self {
            begin,
            type_name: type_name.into(),
            end,
            discriminant: None,
            endpoints: None,
            slot: None,
        }
    }

    /// Relation position embedding its endpoint positions
    #[must_use]
    pub fn relation(
        type_name: impl Into<String>,
        begin: usize,
        end: usize,
        source: Position,
        target: Position,
    ) -> Self {
        Self {
            endpoints: Some(Box::new(Endpoints { source, target })),
            ..Self::span(type_name, begin, end)
        }
    }

    /// Set the discriminant (null counts as absent)
    #[must_use]
    pub fn with_discriminant(mut self, value: Option<Scalar>) -> Self {
        self.discriminant = value.filter(|v| !v.is_null());
        self
    }

    /// Derive the position of a link slot hosted at this position
    #[must_use]
    pub fn with_slot(&self, slot: SlotKey) -> Self {
        Self {
            slot: Some(Box::new(slot)),
            ..self.clone()
        }
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

    /// Annotation type name
    #[inline]
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Discriminating value, if any
    #[inline]
    #[must_use]
    pub fn discriminant(&self) -> Option<&Scalar> {
        self.discriminant.as_ref()
    }

    /// Endpoint positions, for relations
    #[inline]
    #[must_use]
    pub fn endpoints(&self) -> Option<&Endpoints> {
        self.endpoints.as_deref()
    }

    /// Slot key, for link slot positions
    #[inline]
    #[must_use]
    pub fn slot(&self) -> Option<&SlotKey> {
        self.slot.as_deref()
    }

    /// Check if this is a relation position
    #[inline]
    #[must_use]
    pub fn is_relation(&self) -> bool {
        self.endpoints.is_some()
    }

    /// Check if this is a link slot position
    #[inline]
    #[must_use]
    pub fn is_slot(&self) -> bool {
        self.slot.is_some()
    }

    /// Endpoint nesting depth
    ///
    /// Zero for spans; a relation is one deeper than its deepest endpoint.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.endpoints
            .as_ref()
            .map_or(0, |ep| 1 + ep.source.depth().max(ep.target.depth()))
    }

    /// Position of the host annotation (drops the slot key)
    #[must_use]
    pub fn host(&self) -> Self {
        Self {
            slot: None,
            ..self.clone()
        }
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}-{}]", self.type_name, self.begin, self.end)?;
        if let Some(d) = &self.discriminant {
            write!(f, "={d}")?;
        }
        if let Some(ep) = &self.endpoints {
            write!(f, "({} -> {})", ep.source, ep.target)?;
        }
        if let Some(slot) = &self.slot {
            write!(f, ".{}{{", slot.feature)?;
            match (&slot.role, &slot.target) {
                (Some(role), Some(target)) => write!(f, "{role}:{target}")?,
                (Some(role), None) => write!(f, "{role}")?,
                (None, Some(target)) => write!(f, "{target}")?,
                (None, None) => {}
            }
            f.write_str("}")?;
        }
        Ok(())
    }
}

impl Serialize for Position {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_is_begin_then_type() {
        let mut positions = vec![
            Position::span("POS", 5, 9),
            Position::span("Lemma", 5, 9),
            Position::span("POS", 0, 4),
            Position::span("NamedEntity", 0, 12),
        ];
        positions.sort();
        let shown: Vec<String> = positions.iter().map(ToString::to_string).collect();
        assert_eq!(
            shown,
            vec!["NamedEntity[0-12]", "POS[0-4]", "Lemma[5-9]", "POS[5-9]"]
        );
    }

    #[test]
    fn discriminant_distinguishes_and_null_is_absent() {
        let plain = Position::span("NE", 0, 3);
        let per = plain.clone().with_discriminant(Some(Scalar::Str("PER".into())));
        let null = plain.clone().with_discriminant(Some(Scalar::Null));

        assert_ne!(plain, per);
        assert_eq!(plain, null);
        assert_eq!(per.to_string(), "NE[0-3]=\"PER\"");
    }

    #[test]
    fn relation_embeds_endpoints() {
        let a = Position::span("Token", 0, 4);
        let b = Position::span("Token", 5, 9);
        let fwd = Position::relation("Dep", 5, 9, a.clone(), b.clone());
        let rev = Position::relation("Dep", 5, 9, b, a);

        assert!(fwd.is_relation());
        assert_ne!(fwd, rev);
        assert_eq!(fwd.to_string(), "Dep[5-9](Token[0-4] -> Token[5-9])");
    }

    #[test]
    fn depth_follows_endpoint_nesting() {
        let a = Position::span("Token", 0, 4);
        let b = Position::span("Token", 5, 9);
        let dep = Position::relation("Dep", 5, 9, a.clone(), b);
        let meta = Position::relation("Meta", 0, 4, dep.clone(), a.clone());

        assert_eq!(a.depth(), 0);
        assert_eq!(dep.depth(), 1);
        assert_eq!(meta.depth(), 2);
        assert!(meta < dep);
    }

    #[test]
    fn slot_positions_keep_host() {
        let host = Position::span("Event", 0, 9);
        let slot = host.with_slot(SlotKey {
            feature: "args".into(),
            role: Some("agent".into()),
            target: None,
        });

        assert!(slot.is_slot());
        assert_eq!(slot.host(), host);
        assert_eq!(slot.to_string(), "Event[0-9].args{agent}");
        assert!(host < slot);
    }

    #[test]
    fn serializes_as_display_string() {
        let p = Position::span("POS", 0, 4);
        assert_eq!(serde_json::to_string(&p).unwrap(), "\"POS[0-4]\"");
    }
}
