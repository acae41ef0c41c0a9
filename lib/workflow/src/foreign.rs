//! Typed view of a foreign workflow export.
//!
//! Foreign documents (n8n-style exports) are inconsistent: node identifiers
//! may be ids or names, positions may be coordinate pairs or objects, and
//! credential references may be bare ids or objects. Deserialization here is
//! deliberately lenient; only the top-level `nodes` sequence is mandatory.

use crate::error::ImportError;
use crate::node::Position;
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;

/// An externally authored workflow document.
#[derive(Debug, Clone)]
pub struct ForeignWorkflow {
    /// Workflow name, if the document carries one.
    pub name: Option<String>,
    /// The foreign nodes, in document order.
    pub nodes: Vec<ForeignNode>,
    /// The raw connection map, walked leniently by [`Self::connection_entries`].
    connections: JsonValue,
}

impl ForeignWorkflow {
    /// Builds a foreign workflow from an already-parsed JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::MalformedInput`] when the document is not an
    /// object or the `nodes` field is missing or not a sequence. Node
    /// elements themselves never fail: malformed fields fall back to their
    /// defaults.
    pub fn from_value(document: &JsonValue) -> Result<Self, ImportError> {
        let Some(object) = document.as_object() else {
            return Err(ImportError::malformed("workflow document is not an object"));
        };

        let Some(raw_nodes) = object.get("nodes").and_then(JsonValue::as_array) else {
            return Err(ImportError::malformed("workflow has no nodes"));
        };

        let nodes = raw_nodes.iter().map(ForeignNode::from_value).collect();

        Ok(Self {
            name: object
                .get("name")
                .and_then(JsonValue::as_str)
                .map(String::from),
            nodes,
            connections: object.get("connections").cloned().unwrap_or(JsonValue::Null),
        })
    }

    /// Walks the connection map and yields one entry per target descriptor.
    ///
    /// The map is keyed by source node name-or-id; each value holds output
    /// kinds, each kind an array of port buckets, each bucket an array of
    /// target descriptors. Malformed pieces are skipped, not fatal.
    #[must_use]
    pub fn connection_entries(&self) -> Vec<ForeignConnectionEntry> {
        let mut entries = Vec::new();
        let Some(sources) = self.connections.as_object() else {
            return entries;
        };

        for (source_key, port_map) in sources {
            let Some(port_map) = port_map.as_object() else {
                tracing::debug!(source = %source_key, "skipping non-object connection entry");
                continue;
            };
            for (output_kind, buckets) in port_map {
                let Some(buckets) = buckets.as_array() else {
                    tracing::debug!(
                        source = %source_key,
                        output_kind = %output_kind,
                        "skipping non-array port bucket list"
                    );
                    continue;
                };
                for bucket in buckets {
                    let Some(descriptors) = bucket.as_array() else {
                        continue;
                    };
                    for descriptor in descriptors {
                        let Some(node) = descriptor.get("node").and_then(JsonValue::as_str)
                        else {
                            tracing::debug!(
                                source = %source_key,
                                "skipping target descriptor without a node reference"
                            );
                            continue;
                        };
                        entries.push(ForeignConnectionEntry {
                            source_key: source_key.clone(),
                            output_kind: output_kind.clone(),
                            target: ForeignTarget {
                                node: node.to_string(),
                                index: descriptor
                                    .get("index")
                                    .and_then(JsonValue::as_u64)
                                    .unwrap_or(0),
                            },
                        });
                    }
                }
            }
        }

        entries
    }
}

/// A single node from a foreign workflow document.
#[derive(Debug, Clone, Default)]
pub struct ForeignNode {
    /// Foreign identifier, if present.
    pub id: Option<String>,
    /// Display name; connection maps usually reference nodes by name.
    pub name: Option<String>,
    /// Namespaced, producer-qualified type string (dot-separated).
    pub node_type: String,
    /// Canvas position.
    pub position: ForeignPosition,
    /// Free-form parameter mapping.
    pub parameters: Map<String, JsonValue>,
    /// Credential references: service name -> reference.
    pub credentials: BTreeMap<String, ForeignCredentialRef>,
}

impl ForeignNode {
    /// Builds a foreign node from a raw document element.
    ///
    /// Never fails: every field falls back to its default when missing or
    /// malformed, so one odd node cannot abort an otherwise-valid import.
    #[must_use]
    pub fn from_value(raw: &JsonValue) -> Self {
        let Some(object) = raw.as_object() else {
            tracing::debug!("node element is not an object, using defaults");
            return Self::default();
        };

        let credentials = object
            .get("credentials")
            .and_then(JsonValue::as_object)
            .map(|map| {
                map.iter()
                    .filter_map(|(service, value)| {
                        match serde_json::from_value::<ForeignCredentialRef>(value.clone()) {
                            Ok(reference) => Some((service.clone(), reference)),
                            Err(_) => {
                                tracing::debug!(
                                    service = %service,
                                    "skipping unreadable credential reference"
                                );
                                None
                            }
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            id: object
                .get("id")
                .and_then(JsonValue::as_str)
                .map(String::from),
            name: object
                .get("name")
                .and_then(JsonValue::as_str)
                .map(String::from),
            node_type: object
                .get("type")
                .and_then(JsonValue::as_str)
                .unwrap_or_default()
                .to_string(),
            position: object
                .get("position")
                .and_then(|value| serde_json::from_value(value.clone()).ok())
                .unwrap_or_default(),
            parameters: object
                .get("parameters")
                .and_then(JsonValue::as_object)
                .cloned()
                .unwrap_or_default(),
            credentials,
        }
    }
}

/// A foreign canvas position: either a `[x, y]` pair or an `{x, y}` object.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
pub enum ForeignPosition {
    Pair(f64, f64),
    Coords { x: f64, y: f64 },
}

impl Default for ForeignPosition {
    fn default() -> Self {
        Self::Coords { x: 0.0, y: 0.0 }
    }
}

impl From<ForeignPosition> for Position {
    fn from(position: ForeignPosition) -> Self {
        match position {
            ForeignPosition::Pair(x, y) | ForeignPosition::Coords { x, y } => Self::new(x, y),
        }
    }
}

/// A credential reference: either a bare reference id or an object carrying
/// the id alongside display metadata.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ForeignCredentialRef {
    Id(String),
    Detailed {
        id: String,
        #[serde(default)]
        name: Option<String>,
    },
}

impl ForeignCredentialRef {
    /// Returns the credential reference id.
    #[must_use]
    pub fn reference_id(&self) -> &str {
        match self {
            Self::Id(id) | Self::Detailed { id, .. } => id,
        }
    }
}

/// One (source, output kind, target) triple from the foreign connection map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignConnectionEntry {
    /// The connection map key: a source node name-or-id.
    pub source_key: String,
    /// The foreign output kind ("main", "ai_tool", ...).
    pub output_kind: String,
    /// The resolved target descriptor.
    pub target: ForeignTarget,
}

/// A target descriptor inside a connection bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignTarget {
    /// Target node name-or-id.
    pub node: String,
    /// Target input index.
    pub index: u64,
}
