//! The per-editing-session facade.
//!
//! `EditorSession` owns the workflow aggregate, the undo/redo history, and
//! the auto-save scheduler, and exposes the imperative surface the UI layer
//! drives: node/edge CRUD, batch updates, undo/redo, load and save.
//!
//! Every mutation follows the same pipeline: snapshot the graph, apply the
//! change, snapshot again, record history, mark dirty, schedule a save.
//! Structural changes go through the throttled save lane; high-frequency
//! config edits through the debounced lane.
//!
//! One session is constructed per opened workflow and torn down with
//! `shutdown`, which cancels any pending save timers.

use crate::config::{AutoSaveConfig, HistoryConfig};
use crate::edge::{Edge, SourcePort};
use crate::error::{GraphError, LoadError, SaveError};
use crate::graph::{WorkflowData, WorkflowMetadata};
use crate::history::{History, MutationKind};
use crate::node::{Node, NodeConfig, NodeKind};
use crate::persist::{AutoSaver, WorkflowService};
use crate::reference::{upstream_args, UpstreamArgs};
use crate::sync::extract_edges_from_nodes;
use crate::validate::{validate, Finding};
use flowdeck_core::{NodeId, WorkflowId};
use std::sync::{Arc, Mutex, MutexGuard};

/// A partial node update, merged into the existing node field by field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub next_node_ids: Option<Vec<NodeId>>,
    pub config: Option<NodeConfig>,
}

impl NodePatch {
    /// Renames the node.
    #[must_use]
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Replaces the node's configuration.
    #[must_use]
    pub fn with_config(mut self, config: NodeConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Replaces the plain downstream pointers.
    #[must_use]
    pub fn with_next_node_ids(mut self, next_node_ids: Vec<NodeId>) -> Self {
        self.next_node_ids = Some(next_node_ids);
        self
    }

    fn apply(self, node: &mut Node) {
        if let Some(name) = self.name {
            node.name = name;
        }
        if let Some(description) = self.description {
            node.description = Some(description);
        }
        if let Some(next_node_ids) = self.next_node_ids {
            node.next_node_ids = next_node_ids;
        }
        if let Some(config) = self.config {
            node.config = config;
        }
    }
}

/// A group of mutations applied as a single undoable action, e.g. dropping
/// a node onto an existing edge (which splits it into two edges).
#[derive(Debug, Clone, Default)]
pub struct BatchUpdate {
    pub nodes: Vec<(NodeId, NodePatch)>,
    pub add_edges: Vec<Edge>,
    pub delete_edges: Vec<(NodeId, NodeId)>,
}

impl BatchUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.add_edges.is_empty() && self.delete_edges.is_empty()
    }
}

/// An editing session over one workflow.
pub struct EditorSession<S> {
    workflow_id: WorkflowId,
    service: Arc<S>,
    data: Arc<Mutex<WorkflowData>>,
    history: History,
    saver: AutoSaver<S>,
    next_node_id: i64,
    is_loading: bool,
}

impl<S: WorkflowService + 'static> EditorSession<S> {
    /// Creates a session with default configuration.
    #[must_use]
    pub fn new(workflow_id: WorkflowId, service: Arc<S>) -> Self {
        Self::with_config(
            workflow_id,
            service,
            AutoSaveConfig::default(),
            HistoryConfig::default(),
        )
    }

    /// Creates a session with explicit auto-save and history configuration.
    #[must_use]
    pub fn with_config(
        workflow_id: WorkflowId,
        service: Arc<S>,
        auto_save: AutoSaveConfig,
        history: HistoryConfig,
    ) -> Self {
        let data = Arc::new(Mutex::new(WorkflowData::new(workflow_id)));
        let saver = AutoSaver::new(Arc::clone(&service), Arc::clone(&data), auto_save);
        Self {
            workflow_id,
            service,
            data,
            history: History::new(history),
            saver,
            next_node_id: 1,
            is_loading: false,
        }
    }

    fn state(&self) -> MutexGuard<'_, WorkflowData> {
        self.data.lock().expect("editor state lock poisoned")
    }

    /// The shared mutation pipeline: snapshot, apply, snapshot, record,
    /// mark dirty. Returns false when the closure reports a no-op.
    fn mutate<F>(&mut self, kind: MutationKind, apply: F) -> bool
    where
        F: FnOnce(&mut WorkflowData) -> bool,
    {
        let mut data = self.state();
        let before = data.snapshot();
        if !apply(&mut data) {
            return false;
        }
        let after = data.snapshot();
        data.touch();
        drop(data);

        self.history.record(kind, before, after);
        self.saver.note_mutation();
        true
    }

    // ==== node operations ====

    /// Creates a node of the given kind with a fresh id and the default
    /// configuration for its type, and wires up the usual side effects.
    pub fn create_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId::new(self.next_node_id);
        self.next_node_id += 1;
        let node = Node::create(kind, id, self.workflow_id);
        self.add_node(node);
        id
    }

    /// Appends an externally built node.
    pub fn add_node(&mut self, node: Node) {
        self.next_node_id = self.next_node_id.max(node.id.as_i64() + 1);
        let id = node.id;
        if self.mutate(MutationKind::AddNode, |data| {
            data.nodes.push(node);
            true
        }) {
            tracing::debug!(workflow_id = %self.workflow_id, node_id = %id, "node added");
            self.saver.schedule_throttled();
        }
    }

    /// Merges a partial update into a node. A missing id is a silent no-op:
    /// the UI routinely races config edits against deletes.
    pub fn update_node(&mut self, id: NodeId, patch: NodePatch) {
        if self.mutate(MutationKind::UpdateNode, |data| {
            let Some(node) = data.node_mut(id) else {
                return false;
            };
            patch.apply(node);
            true
        }) {
            self.saver.schedule_debounced();
        }
    }

    /// Removes a node, every edge touching it, and its id from every other
    /// node's plain pointers. Branch-embedded pointers are left to the
    /// synchronizer's next full sync.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::NodeNotDeletable` for structural node types.
    pub fn delete_node(&mut self, id: NodeId) -> Result<(), GraphError> {
        {
            let data = self.state();
            match data.node(id) {
                None => return Ok(()),
                Some(node) if !node.kind().is_deletable() => {
                    return Err(GraphError::NodeNotDeletable { node_id: id });
                }
                Some(_) => {}
            }
        }

        if self.mutate(MutationKind::DeleteNode, |data| {
            data.nodes.retain(|n| n.id != id);
            data.edges.retain(|e| !e.touches(id));
            for node in &mut data.nodes {
                node.next_node_ids.retain(|&t| t != id);
            }
            true
        }) {
            tracing::debug!(workflow_id = %self.workflow_id, node_id = %id, "node deleted");
            self.saver.schedule_throttled();
        }
        Ok(())
    }

    // ==== edge operations ====

    /// Adds a connection. A second edge between the same ordered node pair
    /// is suppressed.
    pub fn add_edge(&mut self, edge: Edge) {
        if self.mutate(MutationKind::AddEdge, |data| apply_add_edge(data, edge)) {
            self.saver.schedule_debounced();
        }
    }

    /// Removes the connection between the given ordered node pair.
    pub fn delete_edge(&mut self, source: NodeId, target: NodeId) {
        if self.mutate(MutationKind::DeleteEdge, |data| {
            apply_delete_edge(data, source, target)
        }) {
            self.saver.schedule_debounced();
        }
    }

    /// Applies a group of mutations as one undoable history entry.
    pub fn batch_update(&mut self, batch: BatchUpdate) {
        if batch.is_empty() {
            return;
        }
        if self.mutate(MutationKind::Batch, |data| {
            let mut changed = false;
            for (id, patch) in batch.nodes {
                if let Some(node) = data.node_mut(id) {
                    patch.apply(node);
                    changed = true;
                }
            }
            for edge in batch.add_edges {
                changed |= apply_add_edge(data, edge);
            }
            for (source, target) in batch.delete_edges {
                changed |= apply_delete_edge(data, source, target);
            }
            changed
        }) {
            self.saver.schedule_throttled();
        }
    }

    // ==== history ====

    /// True when an entry can be undone.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// True when an undone entry can be reapplied.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Restores the graph state preceding the last mutation.
    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.history.undo() else {
            return false;
        };
        let mut data = self.state();
        data.restore(snapshot);
        data.touch();
        drop(data);
        self.saver.note_mutation();
        self.saver.schedule_throttled();
        true
    }

    /// Reapplies the most recently undone mutation.
    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.history.redo() else {
            return false;
        };
        let mut data = self.state();
        data.restore(snapshot);
        data.touch();
        drop(data);
        self.saver.note_mutation();
        self.saver.schedule_throttled();
        true
    }

    // ==== load & save ====

    /// Replaces the local state with the backend's, bootstrapping the edge
    /// list from the persisted node pointers and resetting history.
    ///
    /// # Errors
    ///
    /// Returns a `LoadError` when the backend is unreachable or rejects the
    /// fetch.
    pub async fn refresh(&mut self) -> Result<(), LoadError> {
        self.is_loading = true;
        let result = self.service.fetch_workflow(self.workflow_id).await;
        self.is_loading = false;

        let response = result?;
        if !response.is_success() {
            return Err(LoadError::Rejected {
                code: response.code,
                message: response.message,
            });
        }
        let details = response.data.ok_or(LoadError::EmptyPayload)?;

        let edges = extract_edges_from_nodes(&details.nodes);
        let highest_id = details.nodes.iter().map(|n| n.id.as_i64()).max().unwrap_or(0);
        let node_count = details.nodes.len();
        {
            let mut data = self.state();
            data.metadata = WorkflowMetadata {
                name: details.name,
                description: details.description,
                space_id: details.space_id,
                category: details.category,
                version: details.version.clone(),
                modified: details.modified,
            };
            data.nodes = details.nodes;
            data.edges = edges;
            data.last_saved_version = details.version;
            data.is_dirty = false;
        }
        self.next_node_id = self.next_node_id.max(highest_id + 1);
        self.history.clear();

        tracing::info!(
            workflow_id = %self.workflow_id,
            nodes = node_count,
            "workflow loaded"
        );
        Ok(())
    }

    /// Cancels any pending debounce and saves synchronously. Used for the
    /// explicit save action and the navigation-away guard.
    ///
    /// # Errors
    ///
    /// Returns a `SaveError` when the payload cannot be built or the
    /// backend rejects the save.
    pub async fn save_now(&self) -> Result<bool, SaveError> {
        self.saver.save_now().await
    }

    /// Cancels pending save timers. Call when the editing session ends.
    pub fn shutdown(&self) {
        self.saver.shutdown();
    }

    // ==== reads ====

    /// A copy of the current aggregate.
    #[must_use]
    pub fn workflow_data(&self) -> WorkflowData {
        self.state().clone()
    }

    /// A copy of a single node.
    #[must_use]
    pub fn get_node(&self, id: NodeId) -> Option<Node> {
        self.state().node(id).cloned()
    }

    /// Every edge incident to the given node.
    #[must_use]
    pub fn get_edges_by_node(&self, id: NodeId) -> Vec<Edge> {
        self.state().edges_of(id)
    }

    /// Runs the validator over the current graph.
    #[must_use]
    pub fn validate(&self) -> Vec<Finding> {
        validate(&self.state())
    }

    /// Computes the variables referenceable at the given node.
    #[must_use]
    pub fn available_variables(&self, id: NodeId) -> UpstreamArgs {
        upstream_args(id, &self.state())
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.state().is_dirty
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    #[must_use]
    pub fn is_saving(&self) -> bool {
        self.saver.is_saving()
    }

    /// True once auto-save gave up after repeated failures; the user must
    /// save manually (or mutate to re-arm).
    #[must_use]
    pub fn auto_save_suspended(&self) -> bool {
        self.saver.auto_save_suspended()
    }
}

fn apply_add_edge(data: &mut WorkflowData, edge: Edge) -> bool {
    let duplicate = data
        .edges
        .iter()
        .any(|e| e.source == edge.source && e.target == edge.target);
    if duplicate {
        return false;
    }

    match edge.source_port {
        SourcePort::Out => {
            if let Some(source) = data.node_mut(edge.source) {
                if !source.next_node_ids.contains(&edge.target) {
                    source.next_node_ids.push(edge.target);
                }
            }
        }
        SourcePort::Exception => {
            if let Some(source) = data.node_mut(edge.source) {
                source
                    .config
                    .exception
                    .get_or_insert_with(Default::default)
                    .add_flow_target(edge.target);
            }
        }
        // Branch pointer lists are rewritten by the synchronizer on save.
        SourcePort::Branch(_) => {}
    }
    data.edges.push(edge);
    true
}

fn apply_delete_edge(data: &mut WorkflowData, source: NodeId, target: NodeId) -> bool {
    let Some(position) = data.edges.iter().position(|e| e.connects(source, target)) else {
        return false;
    };
    let edge = data.edges.remove(position);

    if let Some(node) = data.node_mut(source) {
        match edge.source_port {
            SourcePort::Out => node.next_node_ids.retain(|&t| t != target),
            SourcePort::Exception => {
                if let Some(exception) = &mut node.config.exception {
                    exception.remove_flow_target(target);
                }
            }
            SourcePort::Branch(_) => {}
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::testing::RecordingService;
    use crate::persist::WorkflowDetails;
    use flowdeck_core::SpaceId;
    use std::time::Duration;

    fn offline_session() -> EditorSession<RecordingService> {
        EditorSession::with_config(
            WorkflowId::new(1),
            Arc::new(RecordingService::default()),
            AutoSaveConfig::disabled(),
            HistoryConfig::default(),
        )
    }

    /// Start(1) -> Llm(2) -> End(3), built through the session surface.
    fn seeded_session() -> EditorSession<RecordingService> {
        let mut session = offline_session();
        let start = session.create_node(NodeKind::Start);
        let llm = session.create_node(NodeKind::Llm);
        let end = session.create_node(NodeKind::End);
        session.add_edge(Edge::new(start, llm));
        session.add_edge(Edge::new(llm, end));
        session
    }

    #[test]
    fn create_node_assigns_sequential_ids() {
        let mut session = offline_session();
        assert_eq!(session.create_node(NodeKind::Start), NodeId::new(1));
        assert_eq!(session.create_node(NodeKind::Llm), NodeId::new(2));

        let node = session.get_node(NodeId::new(2)).expect("node");
        assert_eq!(node.kind(), NodeKind::Llm);
        assert!(session.is_dirty());
    }

    #[test]
    fn add_node_advances_the_id_allocator() {
        let mut session = offline_session();
        session.add_node(Node::create(
            NodeKind::Start,
            NodeId::new(40),
            WorkflowId::new(1),
        ));
        assert_eq!(session.create_node(NodeKind::End), NodeId::new(41));
    }

    #[test]
    fn update_node_merges_patch_fields() {
        let mut session = seeded_session();
        session.update_node(NodeId::new(2), NodePatch::rename("classifier"));

        let node = session.get_node(NodeId::new(2)).expect("node");
        assert_eq!(node.name, "classifier");
        assert_eq!(node.kind(), NodeKind::Llm);
    }

    #[test]
    fn update_of_missing_node_is_silent_and_unrecorded() {
        let mut session = seeded_session();
        let entries_before = session.history.len();
        let data_before = session.workflow_data();

        session.update_node(NodeId::new(99), NodePatch::rename("ghost"));

        assert_eq!(session.history.len(), entries_before);
        assert_eq!(session.workflow_data(), data_before);
    }

    #[test]
    fn delete_node_cascades_edges_and_pointers() {
        let mut session = seeded_session();
        session.delete_node(NodeId::new(2)).expect("deletable");

        let data = session.workflow_data();
        assert!(data.node(NodeId::new(2)).is_none());
        assert!(data.edges.iter().all(|e| !e.touches(NodeId::new(2))));
        for node in &data.nodes {
            assert!(!node.next_node_ids.contains(&NodeId::new(2)));
        }
    }

    #[test]
    fn delete_node_refuses_structural_kinds() {
        let mut session = seeded_session();
        let err = session.delete_node(NodeId::new(1)).unwrap_err();
        assert_eq!(
            err,
            GraphError::NodeNotDeletable {
                node_id: NodeId::new(1)
            }
        );
        assert!(session.get_node(NodeId::new(1)).is_some());
    }

    #[test]
    fn delete_of_missing_node_is_a_silent_noop() {
        let mut session = seeded_session();
        let before = session.history.len();
        session.delete_node(NodeId::new(99)).expect("no-op");
        assert_eq!(session.history.len(), before);
    }

    #[test]
    fn duplicate_edges_are_suppressed() {
        let mut session = seeded_session();
        let before = session.history.len();

        session.add_edge(Edge::new(NodeId::new(1), NodeId::new(2)));

        let data = session.workflow_data();
        let matching = data
            .edges
            .iter()
            .filter(|e| e.connects(NodeId::new(1), NodeId::new(2)))
            .count();
        assert_eq!(matching, 1);
        assert_eq!(session.history.len(), before);

        let start = data.node(NodeId::new(1)).expect("start");
        assert_eq!(start.next_node_ids, vec![NodeId::new(2)]);
    }

    #[test]
    fn delete_edge_removes_the_pointer() {
        let mut session = seeded_session();
        session.delete_edge(NodeId::new(1), NodeId::new(2));

        let data = session.workflow_data();
        assert!(!data
            .edges
            .iter()
            .any(|e| e.connects(NodeId::new(1), NodeId::new(2))));
        assert!(data
            .node(NodeId::new(1))
            .expect("start")
            .next_node_ids
            .is_empty());
    }

    #[test]
    fn exception_edge_maintains_the_exception_config() {
        let mut session = seeded_session();
        // Route llm -> end through the exception port instead of the plain one.
        session.delete_edge(NodeId::new(2), NodeId::new(3));
        session.add_edge(Edge::exception(NodeId::new(2), NodeId::new(3)));

        let node = session.get_node(NodeId::new(2)).expect("llm");
        let exception = node.config.exception.expect("exception config");
        assert_eq!(exception.flow_targets(), &[NodeId::new(3)]);

        session.delete_edge(NodeId::new(2), NodeId::new(3));
        let node = session.get_node(NodeId::new(2)).expect("llm");
        assert!(node
            .config
            .exception
            .expect("exception config")
            .flow_targets()
            .is_empty());
    }

    #[test]
    fn batch_update_records_a_single_history_entry() {
        let mut session = seeded_session();
        let before = session.history.len();

        session.batch_update(BatchUpdate {
            nodes: vec![(NodeId::new(2), NodePatch::rename("renamed"))],
            add_edges: vec![Edge::new(NodeId::new(1), NodeId::new(3))],
            delete_edges: vec![(NodeId::new(2), NodeId::new(3))],
        });

        assert_eq!(session.history.len(), before + 1);
        let data = session.workflow_data();
        assert_eq!(data.node(NodeId::new(2)).expect("node").name, "renamed");
        assert!(data
            .edges
            .iter()
            .any(|e| e.connects(NodeId::new(1), NodeId::new(3))));
        assert!(!data
            .edges
            .iter()
            .any(|e| e.connects(NodeId::new(2), NodeId::new(3))));
    }

    #[test]
    fn undo_redo_round_trips_the_exact_graph() {
        let mut session = offline_session();
        let empty = session.workflow_data().snapshot();

        let start = session.create_node(NodeKind::Start);
        let end = session.create_node(NodeKind::End);
        session.add_edge(Edge::new(start, end));
        session.update_node(end, NodePatch::rename("finish"));
        let full = session.workflow_data().snapshot();

        while session.can_undo() {
            assert!(session.undo());
        }
        assert_eq!(session.workflow_data().snapshot(), empty);

        while session.can_redo() {
            assert!(session.redo());
        }
        assert_eq!(session.workflow_data().snapshot(), full);
        assert!(session.is_dirty());
    }

    #[test]
    fn mutation_after_undo_discards_the_redo_branch() {
        let mut session = seeded_session();
        session.undo();
        assert!(session.can_redo());

        session.create_node(NodeKind::Output);
        assert!(!session.can_redo());
    }

    #[tokio::test]
    async fn save_now_persists_the_synchronized_graph() {
        let mut session = seeded_session();
        // The canvas dropped the llm -> end connection.
        session.delete_edge(NodeId::new(2), NodeId::new(3));

        let saved = session.save_now().await.expect("save");
        assert!(saved);
        assert!(!session.is_dirty());

        let service = Arc::clone(&session.service);
        let saves = service.saves.lock().unwrap();
        let request = saves.last().expect("request");
        assert_eq!(request.start_node_id, NodeId::new(1));
        assert_eq!(request.end_node_id, NodeId::new(3));
        let llm = request.nodes.iter().find(|n| n.id == NodeId::new(2)).expect("llm");
        assert!(llm.next_node_ids.is_empty());
    }

    #[tokio::test]
    async fn refresh_bootstraps_edges_and_resets_history() {
        let workflow_id = WorkflowId::new(1);
        let mut start = Node::create(NodeKind::Start, NodeId::new(1), workflow_id);
        start.next_node_ids = vec![NodeId::new(2)];
        let end = Node::create(NodeKind::End, NodeId::new(2), workflow_id);

        let details = WorkflowDetails {
            id: workflow_id,
            name: "daily digest".to_string(),
            description: None,
            space_id: SpaceId::new(5),
            nodes: vec![start, end],
            category: None,
            version: Some("v3".to_string()),
            modified: None,
        };
        let service = Arc::new(RecordingService::with_details(details));
        let mut session = EditorSession::with_config(
            workflow_id,
            service,
            AutoSaveConfig::disabled(),
            HistoryConfig::default(),
        );

        session.refresh().await.expect("load");

        let data = session.workflow_data();
        assert_eq!(data.nodes.len(), 2);
        assert_eq!(data.edges, vec![Edge::new(NodeId::new(1), NodeId::new(2))]);
        assert_eq!(data.metadata.name, "daily digest");
        assert_eq!(data.last_saved_version.as_deref(), Some("v3"));
        assert!(!data.is_dirty);
        assert!(!session.can_undo());

        // New ids start above the loaded ones.
        assert_eq!(session.create_node(NodeKind::Llm), NodeId::new(3));
    }

    #[tokio::test]
    async fn refresh_failure_surfaces_the_envelope_code() {
        let mut session = EditorSession::with_config(
            WorkflowId::new(1),
            Arc::new(RecordingService::default()),
            AutoSaveConfig::disabled(),
            HistoryConfig::default(),
        );

        let err = session.refresh().await.unwrap_err();
        assert_eq!(
            err,
            LoadError::Rejected {
                code: "4004".to_string(),
                message: Some("workflow not found".to_string()),
            }
        );
        assert!(!session.is_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn config_edits_debounce_into_one_save() {
        let service = Arc::new(RecordingService::default());
        let mut session = EditorSession::new(WorkflowId::new(1), Arc::clone(&service));
        session.add_node(Node::create(NodeKind::Start, NodeId::new(1), WorkflowId::new(1)));
        session.add_node(Node::create(NodeKind::End, NodeId::new(2), WorkflowId::new(1)));
        // Let the throttled lane's leading save drain first.
        tokio::time::sleep(Duration::from_secs(1)).await;
        let attempts_after_seed = service.attempts();

        for i in 0..10 {
            session.update_node(NodeId::new(2), NodePatch::rename(format!("end {i}")));
        }
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(service.attempts(), attempts_after_seed + 1);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_pending_saves() {
        let service = Arc::new(RecordingService::default());
        let mut session = EditorSession::with_config(
            WorkflowId::new(1),
            Arc::clone(&service),
            AutoSaveConfig::default().with_throttle(Duration::from_secs(3600)),
            HistoryConfig::default(),
        );
        session.add_node(Node::create(NodeKind::Start, NodeId::new(1), WorkflowId::new(1)));
        tokio::time::sleep(Duration::from_millis(10)).await;
        let baseline = service.attempts();

        session.update_node(NodeId::new(1), NodePatch::rename("pending"));
        session.shutdown();
        tokio::time::sleep(Duration::from_secs(60)).await;

        assert_eq!(service.attempts(), baseline);
    }
}
