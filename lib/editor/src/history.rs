//! Bounded undo/redo history over graph snapshots.
//!
//! Standard linear history: recording while not at the tip discards the redo
//! tail, and the stack evicts its oldest entries once it exceeds the
//! configured capacity. Unbounded history is rejected as a memory-growth
//! risk for long editing sessions.

use crate::config::HistoryConfig;
use crate::graph::GraphSnapshot;
use chrono::{DateTime, Utc};
use flowdeck_core::HistoryEntryId;
use serde::{Deserialize, Serialize};

/// The kind of mutation a history entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MutationKind {
    AddNode,
    UpdateNode,
    DeleteNode,
    AddEdge,
    DeleteEdge,
    Batch,
}

/// One recorded mutation with its surrounding graph states.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub id: HistoryEntryId,
    pub kind: MutationKind,
    pub recorded_at: DateTime<Utc>,
    pub before: GraphSnapshot,
    pub after: GraphSnapshot,
}

/// The undo/redo stack.
///
/// `index` points at the most recently applied entry; `None` means every
/// recorded entry has been undone (or nothing was recorded yet).
#[derive(Debug)]
pub struct History {
    entries: Vec<HistoryEntry>,
    index: Option<usize>,
    config: HistoryConfig,
}

impl History {
    /// Creates an empty history with the given configuration.
    #[must_use]
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            entries: Vec::new(),
            index: None,
            config,
        }
    }

    /// Records a mutation. Discards any redoable tail first, then evicts the
    /// oldest entry when the stack exceeds its capacity.
    pub fn record(&mut self, kind: MutationKind, before: GraphSnapshot, after: GraphSnapshot) {
        if !self.config.enabled || self.config.capacity == 0 {
            return;
        }

        let keep = self.index.map_or(0, |i| i + 1);
        self.entries.truncate(keep);
        self.entries.push(HistoryEntry {
            id: HistoryEntryId::new(),
            kind,
            recorded_at: Utc::now(),
            before,
            after,
        });
        if self.entries.len() > self.config.capacity {
            self.entries.remove(0);
        }
        self.index = Some(self.entries.len() - 1);
    }

    /// True when an entry can be undone.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.index.is_some()
    }

    /// True when an undone entry can be reapplied.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        match self.index {
            None => !self.entries.is_empty(),
            Some(i) => i + 1 < self.entries.len(),
        }
    }

    /// Steps back one entry, returning the snapshot to restore.
    pub fn undo(&mut self) -> Option<GraphSnapshot> {
        let current = self.index?;
        let snapshot = self.entries[current].before.clone();
        self.index = current.checked_sub(1);
        Some(snapshot)
    }

    /// Steps forward one entry, returning the snapshot to restore.
    pub fn redo(&mut self) -> Option<GraphSnapshot> {
        let next = match self.index {
            None => 0,
            Some(i) => i + 1,
        };
        let snapshot = self.entries.get(next)?.after.clone();
        self.index = Some(next);
        Some(snapshot)
    }

    /// Drops every entry, e.g. after reloading from the backend.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.index = None;
    }

    /// Number of recorded entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The kinds currently on the stack, oldest first. Used by tests and
    /// debugging surfaces.
    #[must_use]
    pub fn kinds(&self) -> Vec<MutationKind> {
        self.entries.iter().map(|e| e.kind).collect()
    }
}
