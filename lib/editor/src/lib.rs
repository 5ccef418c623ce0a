//! Workflow graph data and variable engine for the flowdeck visual editor.
//!
//! This crate owns the directed-graph description of a workflow and
//! everything the editor UI needs to manipulate it safely:
//!
//! - **Graph model**: typed nodes with per-type parameter payloads, and the
//!   canvas edge list derived from the pointers embedded in nodes
//! - **Synchronizer**: the bidirectional projection between node pointers
//!   and edges, with a round-trip identity law
//! - **Variable resolver**: which upstream outputs each node may reference,
//!   including loop-body scoping
//! - **Validator**: cycle, reachability, required-field, and reference
//!   checks producing severity-ranked findings
//! - **History**: bounded undo/redo over deep graph snapshots
//! - **Persistence**: debounced/throttled auto-save with bounded retries,
//!   behind an async backend port
//!
//! The engine prepares and validates workflow descriptions; it does not
//! execute them.

pub mod config;
pub mod edge;
pub mod error;
pub mod graph;
pub mod history;
pub mod node;
pub mod persist;
pub mod reference;
pub mod session;
pub mod sync;
pub mod validate;

pub use config::{AutoSaveConfig, HistoryConfig};
pub use edge::{Edge, SourcePort};
pub use error::{GraphError, LoadError, SaveError, ServiceError};
pub use graph::{GraphSnapshot, WorkflowData, WorkflowMetadata};
pub use history::{History, HistoryEntry, MutationKind};
pub use node::{
    ArgSpec, Binding, DataType, Node, NodeConfig, NodeKind, NodeParams,
};
pub use persist::{
    ApiResponse, AutoSaver, SaveOutcome, SaveWorkflowRequest, WorkflowDetails, WorkflowService,
    SUCCESS_CODE,
};
pub use reference::{
    find_references_to, upstream_args, FoundReference, UpstreamArgs, UpstreamNode,
};
pub use session::{BatchUpdate, EditorSession, NodePatch};
pub use sync::{extract_edges_from_nodes, sync_nodes_from_edges};
pub use validate::{is_loop_boundary_edge, validate, Finding, Severity};
