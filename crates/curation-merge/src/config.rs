//! Merge options and workspace configuration
//!
//! A configuration file looks like:
//!
//! ```toml
//! [merge]
//! merge_incomplete = false
//! bootstrap = false
//!
//! [diff]
//! parallel = true
//! entry_types = ["POS", "Dependency"]
//!
//! [[layers]]
//! type = "POS"
//! kind = "span"
//! compared = ["value"]
//! ```

use crate::error::ConfigError;
use crate::reconciler::Reconciler;
use curation_diff::DiffOptions;
use curation_position::{LayerPolicy, PolicyTable};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Options of a reconciliation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeOptions {
    /// Merge positions where only some annotators contributed (all agreeing)
    pub merge_incomplete: bool,

    /// Clear the curator's entry-type content before merging
    pub bootstrap: bool,
}

impl MergeOptions {
    /// Create default options
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With incomplete merging
    #[inline]
    #[must_use]
    pub fn with_merge_incomplete(mut self, enabled: bool) -> Self {
        self.merge_incomplete = enabled;
        self
    }

    /// With bootstrap
    #[inline]
    #[must_use]
    pub fn with_bootstrap(mut self, enabled: bool) -> Self {
        self.bootstrap = enabled;
        self
    }
}

/// Complete configuration: merge options, diff options, layer policies
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurationConfig {
    /// `[merge]` table
    pub merge: MergeOptions,

    /// `[diff]` table
    pub diff: DiffOptions,

    /// `[[layers]]` array
    pub layers: PolicyTable,
}

impl CurationConfig {
    /// Create default configuration (no layers)
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from TOML text
    ///
    /// # Errors
    /// `Parse` on syntax or shape errors, `Invalid` when an entry type has
    /// no layer
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// `Io` when the file cannot be read; see also
    /// [`CurationConfig::from_toml_str`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), layers = config.layers.len(), "configuration loaded");
        Ok(config)
    }

    /// Render as TOML
    ///
    /// # Errors
    /// Serialization errors
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Check that every configured entry type has a layer
    ///
    /// # Errors
    /// `Invalid` naming the first unknown entry type
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self
            .diff
            .entry_types
            .iter()
            .find(|t| !self.layers.contains(t))
        {
            Some(t) => Err(ConfigError::Invalid(format!(
                "entry type {t:?} has no [[layers]] entry"
            ))),
            None => Ok(()),
        }
    }

    /// With merge options
    #[inline]
    #[must_use]
    pub fn with_merge_options(mut self, merge: MergeOptions) -> Self {
        self.merge = merge;
        self
    }

    /// With diff options
    #[inline]
    #[must_use]
    pub fn with_diff_options(mut self, diff: DiffOptions) -> Self {
        self.diff = diff;
        self
    }

    /// With an additional layer policy
    #[inline]
    #[must_use]
    pub fn with_layer(mut self, layer: LayerPolicy) -> Self {
        self.layers.insert(layer);
        self
    }

    /// Entry types to diff: the configured list, or every layer
    #[must_use]
    pub fn entry_types(&self) -> Vec<String> {
        self.diff.resolve_entry_types(&self.layers)
    }

    /// Reconciler over this configuration
    #[must_use]
    pub fn reconciler(&self) -> Reconciler<'_> {
        Reconciler::new(&self.layers, self.merge).with_diff_options(self.diff.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"
        [merge]
        merge_incomplete = true

        [diff]
        parallel = false
        entry_types = ["POS"]

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
    "#;

    #[test]
    fn parses_all_tables() {
        let config = CurationConfig::from_toml_str(SAMPLE).unwrap();
        assert!(config.merge.merge_incomplete);
        assert!(!config.merge.bootstrap);
        assert!(!config.diff.parallel);
        assert_eq!(config.entry_types(), vec!["POS".to_string()]);
        assert_eq!(config.layers.len(), 2);
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = CurationConfig::from_toml_str("").unwrap();
        assert_eq!(config, CurationConfig::default());
        assert!(config.diff.parallel);
    }

    #[test]
    fn unknown_entry_type_is_invalid() {
        let err = CurationConfig::from_toml_str(
            r#"
            [diff]
            entry_types = ["Lemma"]
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn toml_round_trip() {
        let config = CurationConfig::from_toml_str(SAMPLE).unwrap();
        let text = config.to_toml_string().unwrap();
        assert_eq!(CurationConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = CurationConfig::load(dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));

        let path = dir.path().join("curation.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        assert_eq!(CurationConfig::load(&path).unwrap().layers.len(), 2);
    }
}
