//! The in-memory workflow aggregate.
//!
//! `WorkflowData` is the canonical source of truth during an editing
//! session: the node list, the live edge list, workflow metadata, and the
//! dirty/version bookkeeping consumed by the persistence coordinator.

use crate::edge::Edge;
use crate::node::{Node, NodeKind};
use chrono::{DateTime, Utc};
use flowdeck_core::{NodeId, SpaceId, WorkflowId};
use serde::{Deserialize, Serialize};

/// Metadata describing the workflow being edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowMetadata {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub space_id: SpaceId,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub modified: Option<DateTime<Utc>>,
}

impl WorkflowMetadata {
    /// Creates metadata with the given name and space.
    #[must_use]
    pub fn new(name: impl Into<String>, space_id: SpaceId) -> Self {
        Self {
            name: name.into(),
            description: None,
            space_id,
            category: None,
            version: None,
            modified: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the version.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

/// A deep copy of the graph at one point in time, used for undo/redo.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphSnapshot {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

/// The aggregate owned by an editing session.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowData {
    pub workflow_id: WorkflowId,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub metadata: WorkflowMetadata,
    /// Version string returned by the last successful save.
    pub last_saved_version: Option<String>,
    /// True from the first unsaved mutation until a save round-trip lands.
    pub is_dirty: bool,
    /// Monotonic mutation counter; used to detect edits that race an
    /// in-flight save.
    pub revision: u64,
}

impl WorkflowData {
    /// Creates an empty aggregate for the given workflow.
    #[must_use]
    pub fn new(workflow_id: WorkflowId) -> Self {
        Self {
            workflow_id,
            nodes: Vec::new(),
            edges: Vec::new(),
            metadata: WorkflowMetadata::new("", SpaceId::new(0)),
            last_saved_version: None,
            is_dirty: false,
            revision: 0,
        }
    }

    /// Returns a reference to a node by its ID.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Returns a mutable reference to a node by its ID.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    /// Returns every edge incident to the given node.
    #[must_use]
    pub fn edges_of(&self, id: NodeId) -> Vec<Edge> {
        self.edges.iter().filter(|e| e.touches(id)).copied().collect()
    }

    /// Returns the Start node, if present.
    #[must_use]
    pub fn start_node(&self) -> Option<&Node> {
        self.nodes.iter().find(|n| n.kind() == NodeKind::Start)
    }

    /// Returns the End node, if present.
    #[must_use]
    pub fn end_node(&self) -> Option<&Node> {
        self.nodes.iter().find(|n| n.kind() == NodeKind::End)
    }

    /// Deep-copies the graph for history bookkeeping.
    #[must_use]
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        }
    }

    /// Replaces the graph with a previously taken snapshot.
    pub fn restore(&mut self, snapshot: GraphSnapshot) {
        self.nodes = snapshot.nodes;
        self.edges = snapshot.edges;
    }

    /// Marks the aggregate dirty and bumps the revision counter.
    pub(crate) fn touch(&mut self) {
        self.is_dirty = true;
        self.revision += 1;
    }
}
