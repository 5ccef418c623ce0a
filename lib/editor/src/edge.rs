//! Edge types for the workflow canvas.
//!
//! Edges are the canvas-facing projection of the downstream pointers stored
//! in nodes; they are never persisted directly. Each edge leaves a logical
//! output port on its source node and always enters the single input port of
//! its target.

use flowdeck_core::{BranchId, NodeId};
use std::fmt;

/// The logical output a connection leaves from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourcePort {
    /// The plain output, `"{node}-out"`.
    Out,
    /// The exception-flow output, `"{node}-exception-out"`.
    Exception,
    /// A branch/intent/option output, `"{node}-{uuid}-out"`.
    Branch(BranchId),
}

impl SourcePort {
    /// Renders the canvas port identifier for the given source node.
    #[must_use]
    pub fn encode(&self, source: NodeId) -> String {
        match self {
            Self::Out => format!("{source}-out"),
            Self::Exception => format!("{source}-exception-out"),
            Self::Branch(uuid) => format!("{source}-{uuid}-out"),
        }
    }

    /// Parses a canvas port identifier back into the source node and port.
    #[must_use]
    pub fn decode(raw: &str) -> Option<(NodeId, SourcePort)> {
        let rest = raw.strip_suffix("-out")?;
        if let Some(node) = rest.strip_suffix("-exception") {
            return Some((node.parse().ok()?, Self::Exception));
        }
        match rest.split_once('-') {
            Some((node, uuid)) => Some((node.parse().ok()?, Self::Branch(uuid.parse().ok()?))),
            None => Some((rest.parse().ok()?, Self::Out)),
        }
    }
}

/// A directed connection between two nodes on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
    pub source_port: SourcePort,
}

impl Edge {
    /// Creates an edge leaving the plain output port.
    #[must_use]
    pub fn new(source: NodeId, target: NodeId) -> Self {
        Self {
            source,
            target,
            source_port: SourcePort::Out,
        }
    }

    /// Creates an edge leaving the exception port.
    #[must_use]
    pub fn exception(source: NodeId, target: NodeId) -> Self {
        Self {
            source,
            target,
            source_port: SourcePort::Exception,
        }
    }

    /// Creates an edge leaving a branch port.
    #[must_use]
    pub fn branch(source: NodeId, target: NodeId, uuid: BranchId) -> Self {
        Self {
            source,
            target,
            source_port: SourcePort::Branch(uuid),
        }
    }

    /// The full source port identifier as the canvas sees it.
    #[must_use]
    pub fn source_port_id(&self) -> String {
        self.source_port.encode(self.source)
    }

    /// The target port identifier, always `"{target}-in"`.
    #[must_use]
    pub fn target_port_id(&self) -> String {
        format!("{}-in", self.target)
    }

    /// True when this edge connects the given ordered node pair.
    #[must_use]
    pub fn connects(&self, source: NodeId, target: NodeId) -> bool {
        self.source == source && self.target == target
    }

    /// True when this edge starts or ends at the given node.
    #[must_use]
    pub fn touches(&self, id: NodeId) -> bool {
        self.source == id || self.target == id
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source_port_id(), self.target_port_id())
    }
}
