//! Attribute values
//!
//! A node attribute is a primitive [`Scalar`], a reference to another node,
//! or an ordered array of role-labelled [`Link`]s.

use crate::handle::NodeHandle;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Primitive attribute value
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// Absent / unset
    #[default]
    Null,

    /// Boolean flag
    Bool(bool),

    /// Integer
    Int(i64),

    /// String label
    Str(String),
}

impl Scalar {
    /// Check for null
    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// String content, if this is a string
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl Display for Scalar {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Str(s) => write!(f, "{s:?}"),
        }
    }
}

/// One element of a link array
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Link {
    /// Role label of the slot
    pub role: String,

    /// Slot filler; `None` when the target has been removed or never set
    pub target: Option<NodeHandle>,
}

impl Link {
    /// Create link element
    #[inline]
    #[must_use]
    pub fn new(role: impl Into<String>, target: NodeHandle) -> Self {
        Self {
            role: role.into(),
            target: Some(target),
        }
    }
}

/// Attribute value stored on a node
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// Primitive value
    Scalar(Scalar),

    /// Reference to another node of the same graph (relation endpoint, etc.)
    Ref(Option<NodeHandle>),

    /// Ordered list of role-labelled references
    Links(Vec<Link>),
}

impl Value {
    /// Null scalar
    #[inline]
    #[must_use]
    pub fn null() -> Self {
        Self::Scalar(Scalar::Null)
    }

    /// Scalar content, if primitive
    #[inline]
    #[must_use]
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Self::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Referenced handle, if this is a set reference
    #[inline]
    #[must_use]
    pub fn as_ref_handle(&self) -> Option<NodeHandle> {
        match self {
            Self::Ref(h) => *h,
            _ => None,
        }
    }

    /// Link elements, if this is a link array
    #[inline]
    #[must_use]
    pub fn as_links(&self) -> Option<&[Link]> {
        match self {
            Self::Links(links) => Some(links),
            _ => None,
        }
    }

    /// Short kind name for diagnostics
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "scalar",
            Self::Ref(_) => "reference",
            Self::Links(_) => "link array",
        }
    }

    /// Iterate every handle this value points at
    pub fn referenced(&self) -> impl Iterator<Item = NodeHandle> + '_ {
        let single = match self {
            Self::Ref(h) => *h,
            _ => None,
        };
        let links = self.as_links().unwrap_or(&[]);
        single
            .into_iter()
            .chain(links.iter().filter_map(|l| l.target))
    }
}

impl From<Scalar> for Value {
    fn from(s: Scalar) -> Self {
        Self::Scalar(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Scalar(Scalar::Str(s.to_string()))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Scalar(Scalar::Str(s))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Scalar(Scalar::Int(i))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Scalar(Scalar::Bool(b))
    }
}

impl From<NodeHandle> for Value {
    fn from(h: NodeHandle) -> Self {
        Self::Ref(Some(h))
    }
}

impl From<Vec<Link>> for Value {
    fn from(links: Vec<Link>) -> Self {
        Self::Links(links)
    }
}
