//! JSON interchange form of annotation graphs
//!
//! Handles are runtime-only, so the serialized form names nodes by integer
//! ids local to the document. References are written as `{"ref": id}` and
//! link arrays as `[{"role": ..., "target": id}]`.

use crate::error::GraphError;
use crate::graph::{AnnotationGraph, Node};
use crate::handle::NodeHandle;
use crate::value::{Link, Scalar, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Serialized graph
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphDocument {
    /// Nodes in document order
    #[serde(default)]
    pub nodes: Vec<NodeDocument>,
}

/// Serialized node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDocument {
    /// Document-local id
    pub id: u64,

    /// Annotation type name
    #[serde(rename = "type")]
    pub type_name: String,

    /// Begin offset
    pub begin: usize,

    /// End offset
    pub end: usize,

    /// Attribute values
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub features: IndexMap<String, FeatureValue>,
}

/// Serialized attribute value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    /// Reference to another node by id
    Ref {
        /// Target id, `null` for a loose end
        #[serde(rename = "ref")]
        target: Option<u64>,
    },

    /// Link array
    Links(Vec<LinkDocument>),

    /// Primitive value
    Scalar(Scalar),
}

/// Serialized link element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkDocument {
    /// Role label
    pub role: String,

    /// Target id
    pub target: Option<u64>,
}

impl GraphDocument {
    /// Parse from JSON
    ///
    /// # Errors
    /// JSON syntax or shape errors
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Render as pretty JSON
    ///
    /// # Errors
    /// Serialization errors (not expected for well-formed documents)
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl AnnotationGraph {
    /// Build a graph from its interchange form
    ///
    /// Nodes are created in document order; references are resolved in a
    /// second pass so forward references are allowed.
    ///
    /// # Errors
    /// `DuplicateId`, `UnknownReference`, `InvalidOffsets`
    pub fn from_document(doc: &GraphDocument) -> Result<Self, GraphError> {
        let mut graph = Self::new();
        let mut ids: HashMap<u64, NodeHandle> = HashMap::with_capacity(doc.nodes.len());

        for nd in &doc.nodes {
            let scalars: IndexMap<String, Value> = nd
                .features
                .iter()
                .map(|(name, fv)| {
                    let placeholder = match fv {
                        FeatureValue::Scalar(s) => Value::Scalar(s.clone()),
                        FeatureValue::Ref { .. } => Value::Ref(None),
                        FeatureValue::Links(_) => Value::Links(Vec::new()),
                    };
                    (name.clone(), placeholder)
                })
                .collect();
            let handle = graph.insert(nd.type_name.clone(), nd.begin, nd.end, scalars)?;
            if ids.insert(nd.id, handle).is_some() {
                return Err(GraphError::DuplicateId(nd.id));
            }
        }

        let lookup = |id: Option<u64>| -> Result<Option<NodeHandle>, GraphError> {
            id.map(|id| ids.get(&id).copied().ok_or(GraphError::UnknownReference(id)))
                .transpose()
        };

        for nd in &doc.nodes {
            let handle = ids[&nd.id];
            for (name, fv) in &nd.features {
                let value = match fv {
                    FeatureValue::Scalar(_) => continue,
                    FeatureValue::Ref { target } => Value::Ref(lookup(*target)?),
                    FeatureValue::Links(links) => Value::Links(
                        links
                            .iter()
                            .map(|l| {
                                Ok(Link {
                                    role: l.role.clone(),
                                    target: lookup(l.target)?,
                                })
                            })
                            .collect::<Result<_, GraphError>>()?,
                    ),
                };
                graph.set_attribute(handle, name.clone(), value)?;
            }
        }

        Ok(graph)
    }

    /// Render the graph in interchange form
    ///
    /// Ids are assigned densely in arena order.
    #[must_use]
    pub fn to_document(&self) -> GraphDocument {
        let ids: HashMap<NodeHandle, u64> = self
            .iter()
            .zip(0u64..)
            .map(|(n, id)| (n.handle(), id))
            .collect();
        let id_of = |h: Option<NodeHandle>| h.and_then(|h| ids.get(&h).copied());

        let nodes = self
            .iter()
            .map(|n: &Node| NodeDocument {
                id: ids[&n.handle()],
                type_name: n.type_name().to_string(),
                begin: n.begin(),
                end: n.end(),
                features: n
                    .attributes()
                    .map(|(name, v)| {
                        let fv = match v {
                            Value::Scalar(s) => FeatureValue::Scalar(s.clone()),
                            Value::Ref(h) => FeatureValue::Ref { target: id_of(*h) },
                            Value::Links(links) => FeatureValue::Links(
                                links
                                    .iter()
                                    .map(|l| LinkDocument {
                                        role: l.role.clone(),
                                        target: id_of(l.target),
                                    })
                                    .collect(),
                            ),
                        };
                        (name.to_string(), fv)
                    })
                    .collect(),
            })
            .collect();

        GraphDocument { nodes }
    }
}
