//! Linear undo/redo history of redacted artifacts

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateKind {
    Original,
    FullClean,
    Selective,
}

/// Immutable snapshot of one artifact in the timeline
#[derive(Debug, Clone)]
pub struct HistoryState {
    pub artifact: Arc<[u8]>,
    pub removed_keys: BTreeSet<String>,
    pub kind: StateKind,
    pub created_at: OffsetDateTime,
}

impl HistoryState {
    pub fn new(artifact: impl Into<Arc<[u8]>>, removed_keys: BTreeSet<String>, kind: StateKind) -> Self {
        Self {
            artifact: artifact.into(),
            removed_keys,
            kind,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    pub fn size(&self) -> usize {
        self.artifact.len()
    }
}

/// Single pointer into an append-only sequence of states.
///
/// The first state is always the unmodified original; pushing while undone
/// discards every state after the pointer.
#[derive(Debug, Clone)]
pub struct HistoryManager {
    states: Vec<HistoryState>,
    index: usize,
}

impl HistoryManager {
    pub fn new(original: impl Into<Arc<[u8]>>) -> Self {
        Self {
            states: vec![HistoryState::new(original, BTreeSet::new(), StateKind::Original)],
            index: 0,
        }
    }

    /// Append a state, truncating any undone branch first
    pub fn push(&mut self, state: HistoryState) -> &HistoryState {
        self.states.truncate(self.index + 1);
        self.states.push(state);
        self.index = self.states.len() - 1;
        &self.states[self.index]
    }

    pub fn undo(&mut self) -> &HistoryState {
        if self.index > 0 {
            self.index -= 1;
        }
        &self.states[self.index]
    }

    pub fn redo(&mut self) -> &HistoryState {
        if self.index + 1 < self.states.len() {
            self.index += 1;
        }
        &self.states[self.index]
    }

    pub fn current(&self) -> &HistoryState {
        &self.states[self.index]
    }

    pub fn original(&self) -> &HistoryState {
        &self.states[0]
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.states.len()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Always false: the original state is never removed
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn states(&self) -> &[HistoryState] {
        &self.states
    }
}
