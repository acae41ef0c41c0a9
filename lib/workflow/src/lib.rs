//! Workflow graph model and foreign-workflow import for flowdeck.
//!
//! This crate provides:
//!
//! - **Graph Model**: Directed graphs using petgraph with typed nodes and connections
//! - **Node Kinds**: Trigger, Webhook, Agent, Chat Model, Tool, HTTP Request, Code,
//!   plus a catch-all for everything else
//! - **Import**: Conversion of externally authored workflow exports (n8n-style
//!   JSON documents) into the internal graph model, with detection of credential
//!   and environment-variable references that need user configuration

pub mod connection;
pub mod definition;
pub mod error;
pub mod foreign;
pub mod graph;
pub mod import;
pub mod mapping;
pub mod node;

pub use connection::Connection;
pub use definition::{Workflow, WorkflowMetadata};
pub use error::{GraphError, ImportError};
pub use foreign::{ForeignNode, ForeignWorkflow};
pub use graph::WorkflowGraph;
pub use import::{ImportResult, convert};
pub use node::{Node, NodeId, NodeKind, Position};
