//! Core domain types for the flowdeck workflow studio.
//!
//! This crate provides the strongly-typed identifiers shared by the
//! rest of the workspace.

pub mod id;

pub use id::{ConnectionId, ParseIdError, WorkflowId};
