//! Workflow node types and configurations.
//!
//! Nodes are the building blocks of workflows. Each node has:
//! - A unique ID within the workflow
//! - A kind from a closed set of internal tags
//! - A canvas position and display title/subtitle
//! - An opaque configuration mapping

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;

/// Reserved configuration key holding the original foreign type string for
/// nodes imported as [`NodeKind::Custom`]. Kept so no information is silently
/// dropped when no specific mapping exists.
pub const ORIGINAL_TYPE_KEY: &str = "original_type";

/// A unique identifier for a node within a workflow.
///
/// String-backed rather than ULID-backed: nodes imported from a foreign
/// document keep their original identifier byte-for-byte.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Creates a node ID from any string-like value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// The kind of a workflow node.
///
/// This is the closed set of internal tags; foreign node types without a
/// specific mapping become [`NodeKind::Custom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Entry points that initiate workflow execution (schedule, manual, cron).
    Trigger,
    /// HTTP webhook entry point.
    Webhook,
    /// AI agent execution loop.
    Agent,
    /// Single-shot chat/completion model call.
    ChatModel,
    /// A tool attached to an agent.
    Tool,
    /// Outbound HTTP request.
    HttpRequest,
    /// Inline code block.
    Code,
    /// Catch-all for foreign node types with no specific internal mapping.
    Custom,
}

impl NodeKind {
    /// Configuration keys that must be present and non-empty before a node
    /// of this kind counts as configured.
    #[must_use]
    pub fn required_config(self) -> &'static [&'static str] {
        match self {
            Self::HttpRequest => &["url"],
            Self::ChatModel => &["model"],
            Self::Code => &["code"],
            Self::Trigger
            | Self::Webhook
            | Self::Agent
            | Self::Tool
            | Self::Custom => &[],
        }
    }

    /// Human-readable label for this kind.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Trigger => "Trigger",
            Self::Webhook => "Webhook",
            Self::Agent => "Agent",
            Self::ChatModel => "Chat Model",
            Self::Tool => "Tool",
            Self::HttpRequest => "HTTP Request",
            Self::Code => "Code",
            Self::Custom => "Custom",
        }
    }
}

/// A canvas position for a node.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    /// Creates a position from coordinates.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A workflow node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier for this node within the workflow.
    pub id: NodeId,
    /// The internal node kind.
    pub kind: NodeKind,
    /// Canvas position.
    pub position: Position,
    /// Display title.
    pub title: String,
    /// Display subtitle, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    /// Opaque configuration mapping.
    #[serde(default)]
    pub config: BTreeMap<String, JsonValue>,
    /// Whether the configuration required by this node's kind is present.
    pub configured: bool,
}

impl Node {
    /// Creates a new node with an empty configuration.
    #[must_use]
    pub fn new(id: impl Into<NodeId>, kind: NodeKind, title: impl Into<String>) -> Self {
        let config = BTreeMap::new();
        let configured = Self::config_satisfies(kind, &config);
        Self {
            id: id.into(),
            kind,
            position: Position::default(),
            title: title.into(),
            subtitle: None,
            config,
            configured,
        }
    }

    /// Sets the canvas position.
    #[must_use]
    pub fn at(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    /// Sets the subtitle.
    #[must_use]
    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    /// Sets a configuration entry and refreshes the configured flag.
    #[must_use]
    pub fn with_config(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.config.insert(key.into(), value);
        self.configured = Self::config_satisfies(self.kind, &self.config);
        self
    }

    /// Recomputes the configured flag from the current configuration.
    pub fn refresh_configured(&mut self) {
        self.configured = Self::config_satisfies(self.kind, &self.config);
    }

    /// Whether a configuration mapping satisfies the requirements of a kind.
    ///
    /// A required key counts as satisfied only when present and non-empty:
    /// null values and empty strings do not count.
    #[must_use]
    pub fn config_satisfies(kind: NodeKind, config: &BTreeMap<String, JsonValue>) -> bool {
        kind.required_config().iter().all(|key| match config.get(*key) {
            Some(JsonValue::String(s)) => !s.is_empty(),
            Some(JsonValue::Null) | None => false,
            Some(_) => true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn node_id_preserves_string() {
        let id = NodeId::new("webhook-1");
        assert_eq!(id.as_str(), "webhook-1");
        assert_eq!(id.to_string(), "webhook-1");
    }

    #[test]
    fn trigger_node_needs_no_config() {
        let node = Node::new("t1", NodeKind::Trigger, "Daily Schedule");
        assert!(node.configured);
    }

    #[test]
    fn http_node_requires_url() {
        let node = Node::new("h1", NodeKind::HttpRequest, "Fetch");
        assert!(!node.configured);

        let node = node.with_config("url", json!("https://example.com/api"));
        assert!(node.configured);
    }

    #[test]
    fn empty_string_does_not_satisfy_requirement() {
        let node = Node::new("c1", NodeKind::ChatModel, "Chat")
            .with_config("model", json!(""));
        assert!(!node.configured);
    }

    #[test]
    fn null_does_not_satisfy_requirement() {
        let node =
            Node::new("c1", NodeKind::Code, "Script").with_config("code", JsonValue::Null);
        assert!(!node.configured);
    }

    #[test]
    fn refresh_configured_tracks_mutation() {
        let mut node = Node::new("h1", NodeKind::HttpRequest, "Fetch");
        node.config
            .insert("url".to_string(), json!("https://example.com"));
        assert!(!node.configured);
        node.refresh_configured();
        assert!(node.configured);
    }

    #[test]
    fn node_serde_roundtrip() {
        let node = Node::new("n1", NodeKind::Webhook, "Inbound Hook")
            .at(Position::new(120.0, 40.0))
            .with_subtitle("webhook")
            .with_config("path", json!("/hooks/inbound"));
        let json = serde_json::to_string(&node).expect("serialize");
        let parsed: Node = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(node, parsed);
    }
}
