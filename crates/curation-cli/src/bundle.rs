//! Document bundles
//!
//! A bundle carries every annotator's graph of one document plus the
//! curator's graph, if curation already started:
//!
//! ```json
//! { "annotators": { "alice": { "nodes": [] } }, "curator": { "nodes": [] } }
//! ```

use anyhow::{bail, Context};
use curation_diff::AnnotatorId;
use curation_graph::{AnnotationGraph, GraphDocument};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Serialized bundle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bundle {
    /// Annotator graphs by annotator id
    pub annotators: BTreeMap<String, GraphDocument>,

    /// Curator graph
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub curator: Option<GraphDocument>,
}

impl Bundle {
    /// Read a bundle from a JSON file
    ///
    /// # Errors
    /// I/O and JSON errors, with the path as context
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read bundle {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("failed to parse bundle {}", path.display()))
    }

    /// Build the graphs
    ///
    /// # Errors
    /// Reserved annotator ids and malformed graph documents
    pub fn into_graphs(self) -> anyhow::Result<LoadedBundle> {
        let mut annotators = Vec::with_capacity(self.annotators.len());
        for (name, doc) in self.annotators {
            let id = AnnotatorId::new(name);
            if id.is_curator() {
                bail!("annotator id {id} is reserved for the curator graph");
            }
            let graph = AnnotationGraph::from_document(&doc)
                .with_context(|| format!("malformed graph of annotator {id}"))?;
            annotators.push((id, graph));
        }
        let curator = match self.curator {
            Some(doc) => Some(AnnotationGraph::from_document(&doc).context("malformed curator graph")?),
            None => None,
        };
        tracing::debug!(
            annotators = annotators.len(),
            curator = curator.is_some(),
            "bundle loaded"
        );
        Ok(LoadedBundle {
            annotators,
            curator,
        })
    }
}

/// Bundle with its graphs built
#[derive(Debug)]
pub struct LoadedBundle {
    /// Annotator graphs, sorted by id
    pub annotators: Vec<(AnnotatorId, AnnotationGraph)>,

    /// Curator graph, if present
    pub curator: Option<AnnotationGraph>,
}

impl LoadedBundle {
    /// Annotator graphs in the shape the diff engine takes
    pub fn sources(&self) -> impl Iterator<Item = (AnnotatorId, &AnnotationGraph)> {
        self.annotators.iter().map(|(id, g)| (id.clone(), g))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bundle_without_curator() {
        let bundle: Bundle = serde_json::from_str(
            r#"{
                "annotators": {
                    "alice": { "nodes": [ { "id": 1, "type": "POS", "begin": 0, "end": 4,
                                            "features": { "value": "NN" } } ] },
                    "bob": { "nodes": [] }
                }
            }"#,
        )
        .unwrap();
        assert!(bundle.curator.is_none());

        let loaded = bundle.into_graphs().unwrap();
        let ids: Vec<String> = loaded.sources().map(|(id, _)| id.to_string()).collect();
        assert_eq!(ids, vec!["alice".to_string(), "bob".to_string()]);
        assert_eq!(loaded.annotators[0].1.len(), 1);
    }

    #[test]
    fn curator_id_is_reserved() {
        let mut bundle = Bundle::default();
        bundle
            .annotators
            .insert(curation_diff::CURATOR.to_string(), GraphDocument::default());
        assert!(bundle.into_graphs().is_err());
    }

    #[test]
    fn load_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bundle.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = Bundle::load(&path).unwrap_err();
        assert!(err.to_string().contains("bundle.json"));
    }
}
