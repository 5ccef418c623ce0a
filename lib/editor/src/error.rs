//! Error types for the editor crate.
//!
//! Each enum covers one layer: `GraphError` for in-memory graph operations,
//! `ServiceError` for transport failures of the persistence port, and
//! `SaveError`/`LoadError` for the save and load paths that wrap them.
//! Operations on missing node/edge ids are deliberately silent no-ops rather
//! than errors, since the UI routinely races deletes against pending edits.

use flowdeck_core::NodeId;
use std::fmt;

/// Errors from graph store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// Structural node types (Start, End, loop boundaries) cannot be removed.
    NodeNotDeletable { node_id: NodeId },
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NodeNotDeletable { node_id } => {
                write!(f, "node {node_id} is structural and cannot be deleted")
            }
        }
    }
}

impl std::error::Error for GraphError {}

/// Transport-level failures of the persistence backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The backend could not be reached.
    Unreachable { message: String },
    /// The backend replied with a payload the client cannot use.
    InvalidResponse { message: String },
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreachable { message } => write!(f, "backend unreachable: {message}"),
            Self::InvalidResponse { message } => write!(f, "invalid backend response: {message}"),
        }
    }
}

impl std::error::Error for ServiceError {}

/// Errors from the save path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveError {
    /// The graph has no Start or no End node; a full save payload cannot be
    /// built without them.
    MissingStructuralNodes,
    /// The backend rejected the save with a non-success envelope code.
    Rejected {
        code: String,
        message: Option<String>,
    },
    /// Transport failure.
    Service(ServiceError),
}

impl fmt::Display for SaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingStructuralNodes => {
                write!(f, "workflow is missing its start or end node")
            }
            Self::Rejected { code, message } => match message {
                Some(message) => write!(f, "save rejected ({code}): {message}"),
                None => write!(f, "save rejected ({code})"),
            },
            Self::Service(e) => write!(f, "save failed: {e}"),
        }
    }
}

impl std::error::Error for SaveError {}

impl From<ServiceError> for SaveError {
    fn from(e: ServiceError) -> Self {
        Self::Service(e)
    }
}

/// Errors from the load path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// The backend rejected the fetch with a non-success envelope code.
    Rejected {
        code: String,
        message: Option<String>,
    },
    /// The backend reported success but sent no workflow payload.
    EmptyPayload,
    /// Transport failure.
    Service(ServiceError),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected { code, message } => match message {
                Some(message) => write!(f, "load rejected ({code}): {message}"),
                None => write!(f, "load rejected ({code})"),
            },
            Self::EmptyPayload => write!(f, "load succeeded but returned no workflow"),
            Self::Service(e) => write!(f, "load failed: {e}"),
        }
    }
}

impl std::error::Error for LoadError {}

impl From<ServiceError> for LoadError {
    fn from(e: ServiceError) -> Self {
        Self::Service(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graph_error_display() {
        let err = GraphError::NodeNotDeletable {
            node_id: NodeId::new(1),
        };
        assert!(err.to_string().contains("cannot be deleted"));
    }

    #[test]
    fn save_error_display_includes_code() {
        let err = SaveError::Rejected {
            code: "5001".to_string(),
            message: Some("backend busy".to_string()),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("5001"));
        assert!(rendered.contains("backend busy"));
    }

    #[test]
    fn service_error_converts_into_save_error() {
        let err: SaveError = ServiceError::Unreachable {
            message: "timeout".to_string(),
        }
        .into();
        assert!(matches!(err, SaveError::Service(_)));
    }
}
