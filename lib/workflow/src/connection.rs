//! Connection types for workflow graphs.
//!
//! Connections join a source node's output port to a target node's input
//! port. Port names are plain strings; the import mapping tables decide
//! which names a foreign output kind translates to.

use crate::node::NodeId;
use flowdeck_core::ConnectionId;
use serde::{Deserialize, Serialize};

/// Default port names for a general-purpose connection.
pub const DEFAULT_SOURCE_PORT: &str = "output";
pub const DEFAULT_TARGET_PORT: &str = "input";

/// A connection between two nodes in a workflow graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    /// Unique identifier for this connection.
    pub id: ConnectionId,
    /// The source node.
    pub source: NodeId,
    /// The target node.
    pub target: NodeId,
    /// The name of the output port on the source node.
    pub source_port: String,
    /// The name of the input port on the target node.
    pub target_port: String,
    /// Optional display label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Connection {
    /// Creates a new connection with a freshly generated identifier.
    #[must_use]
    pub fn new(
        source: impl Into<NodeId>,
        target: impl Into<NodeId>,
        source_port: impl Into<String>,
        target_port: impl Into<String>,
    ) -> Self {
        Self {
            id: ConnectionId::new(),
            source: source.into(),
            target: target.into(),
            source_port: source_port.into(),
            target_port: target_port.into(),
            label: None,
        }
    }

    /// Creates a connection using the default port names ("output" -> "input").
    #[must_use]
    pub fn with_default_ports(source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self::new(source, target, DEFAULT_SOURCE_PORT, DEFAULT_TARGET_PORT)
    }

    /// Sets the display label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_default_ports() {
        let conn = Connection::with_default_ports("a", "b");
        assert_eq!(conn.source_port, "output");
        assert_eq!(conn.target_port, "input");
        assert_eq!(conn.source.as_str(), "a");
        assert_eq!(conn.target.as_str(), "b");
    }

    #[test]
    fn connection_custom_ports() {
        let conn = Connection::new("agent", "search", "tool", "input");
        assert_eq!(conn.source_port, "tool");
        assert_eq!(conn.target_port, "input");
    }

    #[test]
    fn connection_ids_are_unique() {
        let a = Connection::with_default_ports("a", "b");
        let b = Connection::with_default_ports("a", "b");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn connection_serde_roundtrip() {
        let conn = Connection::new("a", "b", "output", "input").with_label("on success");
        let json = serde_json::to_string(&conn).expect("serialize");
        let parsed: Connection = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(conn, parsed);
    }
}
