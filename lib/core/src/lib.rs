//! Core domain types and utilities for the flowdeck workflow editor.
//!
//! This crate provides the foundational identifier types and error handling
//! shared by the flowdeck editor crates.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{BranchId, HistoryEntryId, NodeId, ParseIdError, SpaceId, WorkflowId};
