//! Error types for the workflow crate.
//!
//! - `GraphError`: low-level graph operations (nodes, connections)
//! - `ImportError`: fatal problems with a foreign workflow document
//!
//! Per-node and per-connection anomalies during import are never errors;
//! they degrade into catch-all node kinds and dropped connections.

use crate::node::NodeId;
use std::fmt;

/// Errors from graph operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// Node with the given ID was not found in the graph.
    NodeNotFound { node_id: NodeId },
    /// Two nodes with the same ID were inserted into the graph.
    DuplicateNode { node_id: NodeId },
    /// Graph contains cycles.
    CycleDetected,
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NodeNotFound { node_id } => {
                write!(f, "node not found: {node_id}")
            }
            Self::DuplicateNode { node_id } => {
                write!(f, "duplicate node id: {node_id}")
            }
            Self::CycleDetected => write!(f, "graph contains cycles"),
        }
    }
}

impl std::error::Error for GraphError {}

/// Errors from foreign workflow import.
///
/// Only structural problems with the top-level document are fatal; everything
/// else is absorbed into the [`crate::import::ImportResult`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    /// The top-level document shape is invalid.
    MalformedInput { reason: String },
}

impl ImportError {
    /// Creates a malformed-input error.
    #[must_use]
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedInput { reason } => {
                write!(f, "malformed workflow document: {reason}")
            }
        }
    }
}

impl std::error::Error for ImportError {}
