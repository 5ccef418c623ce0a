//! Persistence coordination: the backend port and the auto-save scheduler.
//!
//! The backend is reached through the `WorkflowService` trait so the engine
//! can be exercised against an in-memory implementation. All responses use
//! the uniform `{code, data, message}` envelope with a fixed success code.
//!
//! `AutoSaver` runs two scheduling lanes over one save path: a throttled
//! lane for structural mutations (bursts collapse to a leading fire plus at
//! most one trailing fire per window) and a debounced lane for
//! high-frequency config edits (waits for a quiet period). Failed saves are
//! retried on a fixed delay up to a cap, after which auto-save suspends
//! until the next mutation re-arms it.

use crate::config::AutoSaveConfig;
use crate::error::{SaveError, ServiceError};
use crate::graph::WorkflowData;
use crate::node::{Node, NodeKind};
use crate::sync::sync_nodes_from_edges;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flowdeck_core::{NodeId, SpaceId, WorkflowId};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Envelope code signalling success.
pub const SUCCESS_CODE: &str = "0000";

/// The uniform response envelope used by the workflow backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub code: String,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Wraps a payload in a success envelope.
    #[must_use]
    pub fn ok(data: T) -> Self {
        Self {
            code: SUCCESS_CODE.to_string(),
            data: Some(data),
            message: None,
        }
    }

    /// Builds an error envelope.
    #[must_use]
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            data: None,
            message: Some(message.into()),
        }
    }

    /// True when the envelope carries the success code.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.code == SUCCESS_CODE
    }
}

/// Full workflow payload returned by the details fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDetails {
    pub id: WorkflowId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub space_id: SpaceId,
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub modified: Option<DateTime<Utc>>,
}

/// Full-workflow save request. Node pointers are synchronized from the live
/// edge list before this is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveWorkflowRequest {
    pub workflow_id: WorkflowId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub space_id: SpaceId,
    pub nodes: Vec<Node>,
    pub start_node_id: NodeId,
    pub end_node_id: NodeId,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

/// Payload of a successful save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveOutcome {
    #[serde(default)]
    pub version: Option<String>,
}

/// Port to the workflow backend.
#[async_trait]
pub trait WorkflowService: Send + Sync {
    /// Fetches the full workflow (nodes plus metadata).
    async fn fetch_workflow(
        &self,
        workflow_id: WorkflowId,
    ) -> Result<ApiResponse<WorkflowDetails>, ServiceError>;

    /// Persists the full workflow.
    async fn save_workflow(
        &self,
        request: SaveWorkflowRequest,
    ) -> Result<ApiResponse<SaveOutcome>, ServiceError>;
}

/// Builds the full save payload from the current aggregate.
///
/// Node pointers are rewritten from the live edge list first, so the
/// persisted data reflects exactly the current canvas connections.
pub(crate) fn build_save_request(data: &WorkflowData) -> Result<SaveWorkflowRequest, SaveError> {
    let nodes = sync_nodes_from_edges(&data.nodes, &data.edges);
    let start_node_id = nodes
        .iter()
        .find(|n| n.kind() == NodeKind::Start)
        .map(|n| n.id)
        .ok_or(SaveError::MissingStructuralNodes)?;
    let end_node_id = nodes
        .iter()
        .find(|n| n.kind() == NodeKind::End)
        .map(|n| n.id)
        .ok_or(SaveError::MissingStructuralNodes)?;

    Ok(SaveWorkflowRequest {
        workflow_id: data.workflow_id,
        name: data.metadata.name.clone(),
        description: data.metadata.description.clone(),
        space_id: data.metadata.space_id,
        nodes,
        start_node_id,
        end_node_id,
        category: data.metadata.category.clone(),
        version: data.metadata.version.clone(),
    })
}

struct Timers {
    debounce: Option<JoinHandle<()>>,
    trailing: Option<JoinHandle<()>>,
    retry: Option<JoinHandle<()>>,
    last_fire: Option<Instant>,
}

impl Timers {
    const fn new() -> Self {
        Self {
            debounce: None,
            trailing: None,
            retry: None,
            last_fire: None,
        }
    }
}

/// Debounced/throttled auto-save over a shared aggregate.
///
/// Cheap to clone; clones share all scheduling state.
pub struct AutoSaver<S> {
    service: Arc<S>,
    data: Arc<Mutex<WorkflowData>>,
    config: AutoSaveConfig,
    timers: Arc<Mutex<Timers>>,
    saving: Arc<AtomicBool>,
    suspended: Arc<AtomicBool>,
    retry_count: Arc<AtomicU32>,
}

impl<S> Clone for AutoSaver<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            data: Arc::clone(&self.data),
            config: self.config.clone(),
            timers: Arc::clone(&self.timers),
            saving: Arc::clone(&self.saving),
            suspended: Arc::clone(&self.suspended),
            retry_count: Arc::clone(&self.retry_count),
        }
    }
}

/// Clears the in-flight flag even on early returns.
struct SavingGuard(Arc<AtomicBool>);

impl Drop for SavingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl<S: WorkflowService + 'static> AutoSaver<S> {
    /// Creates a saver over the shared aggregate.
    #[must_use]
    pub fn new(service: Arc<S>, data: Arc<Mutex<WorkflowData>>, config: AutoSaveConfig) -> Self {
        Self {
            service,
            data,
            config,
            timers: Arc::new(Mutex::new(Timers::new())),
            saving: Arc::new(AtomicBool::new(false)),
            suspended: Arc::new(AtomicBool::new(false)),
            retry_count: Arc::new(AtomicU32::new(0)),
        }
    }

    /// True while a save round-trip is in flight.
    #[must_use]
    pub fn is_saving(&self) -> bool {
        self.saving.load(Ordering::SeqCst)
    }

    /// True once the retry cap was exhausted; only `save_now` or a new
    /// mutation get saving going again.
    #[must_use]
    pub fn auto_save_suspended(&self) -> bool {
        self.suspended.load(Ordering::SeqCst)
    }

    /// Called on every mutation: a suspension is lifted and retries re-arm.
    pub fn note_mutation(&self) {
        if self.suspended.swap(false, Ordering::SeqCst) {
            self.retry_count.store(0, Ordering::SeqCst);
        }
    }

    /// Throttled lane, for structural mutations. Fires immediately when
    /// outside the window, otherwise at most once more at the window's end.
    pub fn schedule_throttled(&self) {
        if !self.config.enabled || self.auto_save_suspended() {
            return;
        }

        let mut timers = self.timers.lock().expect("saver timer lock poisoned");
        let now = Instant::now();
        let window = self.config.throttle;
        let since_last = timers.last_fire.map(|t| now.duration_since(t));

        if since_last.is_none_or(|elapsed| elapsed >= window) {
            timers.last_fire = Some(now);
            drop(timers);
            let saver = self.clone();
            tokio::spawn(async move {
                let _ = saver.do_save().await;
            });
            return;
        }

        let trailing_alive = timers
            .trailing
            .as_ref()
            .is_some_and(|handle| !handle.is_finished());
        if trailing_alive {
            return;
        }
        let remaining = window.saturating_sub(since_last.unwrap_or_default());
        let saver = self.clone();
        timers.trailing = Some(tokio::spawn(async move {
            tokio::time::sleep(remaining).await;
            saver
                .timers
                .lock()
                .expect("saver timer lock poisoned")
                .last_fire = Some(Instant::now());
            let _ = saver.do_save().await;
        }));
    }

    /// Debounced lane, for high-frequency config edits. Each call restarts
    /// the quiet-period timer.
    pub fn schedule_debounced(&self) {
        if !self.config.enabled || self.auto_save_suspended() {
            return;
        }

        let mut timers = self.timers.lock().expect("saver timer lock poisoned");
        if let Some(handle) = timers.debounce.take() {
            handle.abort();
        }
        let saver = self.clone();
        let wait = self.config.debounce;
        timers.debounce = Some(tokio::spawn(async move {
            tokio::time::sleep(wait).await;
            let _ = saver.do_save().await;
        }));
    }

    /// Cancels any pending debounce and saves synchronously.
    ///
    /// Returns `Ok(true)` when a save round-trip completed, `Ok(false)` when
    /// there was nothing to save (clean state or a save already in flight).
    pub async fn save_now(&self) -> Result<bool, SaveError> {
        if let Some(handle) = self
            .timers
            .lock()
            .expect("saver timer lock poisoned")
            .debounce
            .take()
        {
            handle.abort();
        }
        self.do_save().await
    }

    /// Aborts every pending timer. Called on session teardown.
    pub fn shutdown(&self) {
        let mut timers = self.timers.lock().expect("saver timer lock poisoned");
        for handle in [
            timers.debounce.take(),
            timers.trailing.take(),
            timers.retry.take(),
        ]
        .into_iter()
        .flatten()
        {
            handle.abort();
        }
    }

    /// The single save path both lanes feed into.
    ///
    /// Serializes the state as of send time. Success clears the dirty flag
    /// only when no mutation raced the round-trip (revision check), so a
    /// racing edit is picked up by the next scheduled save.
    async fn do_save(&self) -> Result<bool, SaveError> {
        if self.saving.swap(true, Ordering::SeqCst) {
            return Ok(false);
        }
        let _guard = SavingGuard(Arc::clone(&self.saving));

        let (request, revision) = {
            let data = self.data.lock().expect("editor state lock poisoned");
            if !data.is_dirty {
                return Ok(false);
            }
            (build_save_request(&data)?, data.revision)
        };

        tracing::debug!(
            workflow_id = %request.workflow_id,
            nodes = request.nodes.len(),
            "dispatching workflow save"
        );

        match self.service.save_workflow(request).await {
            Ok(response) if response.is_success() => {
                let version = response.data.and_then(|outcome| outcome.version);
                let mut data = self.data.lock().expect("editor state lock poisoned");
                if data.revision == revision {
                    data.is_dirty = false;
                }
                if version.is_some() {
                    data.last_saved_version = version;
                }
                self.retry_count.store(0, Ordering::SeqCst);
                tracing::info!(workflow_id = %data.workflow_id, "workflow saved");
                Ok(true)
            }
            Ok(response) => {
                let error = SaveError::Rejected {
                    code: response.code,
                    message: response.message,
                };
                self.handle_failure(&error);
                Err(error)
            }
            Err(e) => {
                let error = SaveError::Service(e);
                self.handle_failure(&error);
                Err(error)
            }
        }
    }

    fn handle_failure(&self, error: &SaveError) {
        let attempt = self.retry_count.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt <= self.config.max_retries {
            tracing::warn!(
                error = %error,
                attempt,
                max_retries = self.config.max_retries,
                "workflow save failed, scheduling retry"
            );
            let saver = self.clone();
            let delay = self.config.retry_delay;
            let handle = tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                let _ = saver.do_save().await;
            });
            self.timers.lock().expect("saver timer lock poisoned").retry = Some(handle);
        } else {
            self.suspended.store(true, Ordering::SeqCst);
            tracing::warn!(
                error = %error,
                "workflow auto-save suspended after repeated failures, manual save required"
            );
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Recording backend double shared by the persistence and session tests.
    #[derive(Default)]
    pub(crate) struct RecordingService {
        pub saves: Mutex<Vec<SaveWorkflowRequest>>,
        attempts: AtomicU32,
        fail_next: AtomicU32,
        pub version: Mutex<Option<String>>,
        pub details: Mutex<Option<WorkflowDetails>>,
    }

    impl RecordingService {
        pub fn with_details(details: WorkflowDetails) -> Self {
            let service = Self::default();
            *service.details.lock().unwrap() = Some(details);
            service
        }

        /// Total save calls, including failed ones.
        pub fn attempts(&self) -> u32 {
            self.attempts.load(Ordering::SeqCst)
        }

        /// Successfully recorded save requests.
        pub fn save_count(&self) -> usize {
            self.saves.lock().unwrap().len()
        }

        /// Makes the next `n` save calls fail with an error envelope.
        pub fn fail_times(&self, n: u32) {
            self.fail_next.store(n, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl WorkflowService for RecordingService {
        async fn fetch_workflow(
            &self,
            _workflow_id: WorkflowId,
        ) -> Result<ApiResponse<WorkflowDetails>, ServiceError> {
            match self.details.lock().unwrap().clone() {
                Some(details) => Ok(ApiResponse::ok(details)),
                None => Ok(ApiResponse::error("4004", "workflow not found")),
            }
        }

        async fn save_workflow(
            &self,
            request: SaveWorkflowRequest,
        ) -> Result<ApiResponse<SaveOutcome>, ServiceError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            let remaining = self.fail_next.load(Ordering::SeqCst);
            if remaining > 0 {
                self.fail_next.store(remaining - 1, Ordering::SeqCst);
                return Ok(ApiResponse::error("5000", "backend unavailable"));
            }
            self.saves.lock().unwrap().push(request);
            Ok(ApiResponse::ok(SaveOutcome {
                version: self.version.lock().unwrap().clone(),
            }))
        }
    }
}
