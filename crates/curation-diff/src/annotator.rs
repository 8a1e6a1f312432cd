//! Annotator identity

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Name of the curator pseudo-annotator
pub const CURATOR: &str = "CURATOR";

/// Identity of the annotator that produced a graph
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotatorId(String);

impl AnnotatorId {
    /// Create annotator id
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The curator pseudo-annotator
    #[inline]
    #[must_use]
    pub fn curator() -> Self {
        Self(CURATOR.to_string())
    }

    /// Check if this is the curator pseudo-annotator
    #[inline]
    #[must_use]
    pub fn is_curator(&self) -> bool {
        self.0 == CURATOR
    }

    /// Id as string
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for AnnotatorId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AnnotatorId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for AnnotatorId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curator_is_recognised() {
        assert!(AnnotatorId::curator().is_curator());
        assert!(!AnnotatorId::from("alice").is_curator());
        assert_eq!(AnnotatorId::curator().to_string(), CURATOR);
    }
}
