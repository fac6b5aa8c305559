// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Structura and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Content store: the single source of truth for top-level state.
//!
//! Holds the active result, the view mode, the in-flight flag and the history list. Every
//! mutating operation publishes a new revision to subscribers and (except for `loading`) writes
//! a full snapshot through the configured [`SnapshotBackend`]. Persistence failures are logged
//! and remembered; the in-memory state stays authoritative.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::history::{History, HISTORY_CAPACITY};
use crate::model::{TopicResult, ViewMode};

pub mod snapshot;

pub use snapshot::{
    JsonFileBackend, MemoryBackend, PersistedState, SnapshotBackend, StoreError, WriteDurability,
    STATE_FILE_NAME,
};

/// One published revision of the store state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StoreSnapshot {
    rev: u64,
    active_result: Option<Arc<TopicResult>>,
    mode: ViewMode,
    history: History,
    loading: bool,
}

impl StoreSnapshot {
    pub fn rev(&self) -> u64 {
        self.rev
    }

    pub fn active_result(&self) -> Option<&Arc<TopicResult>> {
        self.active_result.as_ref()
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    fn to_persisted(&self) -> PersistedState {
        PersistedState {
            history: self.history.iter().map(|entry| TopicResult::clone(entry)).collect(),
            active_result: self.active_result.as_deref().cloned(),
            mode: self.mode,
        }
    }
}

#[derive(Debug)]
pub struct ContentStore {
    backend: Box<dyn SnapshotBackend>,
    state: watch::Sender<StoreSnapshot>,
    last_persist_error: Option<StoreError>,
}

impl ContentStore {
    /// Opens the store with the default history capacity.
    pub fn open(backend: impl SnapshotBackend + 'static) -> Self {
        Self::open_with_capacity(backend, HISTORY_CAPACITY)
    }

    /// Loads the persisted snapshot, falling back to the empty state when it is missing or
    /// unreadable.
    ///
    /// Persisted histories that exceed `history_capacity` or repeat a topic are normalized.
    pub fn open_with_capacity(backend: impl SnapshotBackend + 'static, history_capacity: usize) -> Self {
        let persisted = match backend.load() {
            Ok(Some(persisted)) => persisted,
            Ok(None) => {
                debug!("no persisted snapshot; starting empty");
                PersistedState::default()
            }
            Err(err) => {
                warn!(error = %err, "persisted snapshot unreadable; starting empty");
                PersistedState::default()
            }
        };

        let history = History::from_entries(history_capacity, persisted.history.into_iter().map(Arc::new));
        let initial = StoreSnapshot {
            rev: 0,
            active_result: persisted.active_result.map(Arc::new),
            mode: persisted.mode,
            history,
            loading: false,
        };
        let (state, _) = watch::channel(initial);
        Self { backend: Box::new(backend), state, last_persist_error: None }
    }

    /// The current state.
    pub fn snapshot(&self) -> StoreSnapshot {
        self.state.borrow().clone()
    }

    /// A receiver that observes every subsequent revision.
    pub fn subscribe(&self) -> watch::Receiver<StoreSnapshot> {
        self.state.subscribe()
    }

    pub fn active_result(&self) -> Option<Arc<TopicResult>> {
        self.state.borrow().active_result.clone()
    }

    pub fn mode(&self) -> ViewMode {
        self.state.borrow().mode
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    /// The error from the most recent failed write, cleared by the next successful one.
    pub fn last_persist_error(&self) -> Option<&StoreError> {
        self.last_persist_error.as_ref()
    }

    pub fn set_active_result(&mut self, result: Option<Arc<TopicResult>>) {
        self.update(|state| state.active_result = result);
    }

    pub fn set_mode(&mut self, mode: ViewMode) {
        self.update(|state| state.mode = mode);
    }

    /// Marks an in-flight top-level generation. Never persisted.
    pub fn set_loading(&mut self, loading: bool) {
        self.state.send_modify(|state| {
            state.loading = loading;
            state.rev += 1;
        });
    }

    /// Makes `result` active and records it in history in a single revision.
    pub fn accept_result(&mut self, result: Arc<TopicResult>) {
        self.update(|state| {
            state.history.add(Arc::clone(&result));
            state.active_result = Some(result);
        });
    }

    pub fn add_history(&mut self, result: Arc<TopicResult>) {
        self.update(|state| state.history.add(result));
    }

    /// Removes the history entry for `topic`; returns whether one was present.
    pub fn remove_history(&mut self, topic: &str) -> bool {
        if !self.state.borrow().history.contains(topic) {
            return false;
        }
        self.update(|state| {
            state.history.remove(topic);
        });
        true
    }

    pub fn clear_history(&mut self) {
        self.update(|state| state.history.clear());
    }

    /// Makes the history entry for `topic` active without reordering history.
    pub fn restore(&mut self, topic: &str) -> Option<Arc<TopicResult>> {
        let entry = self.state.borrow().history.get(topic).cloned()?;
        self.set_active_result(Some(Arc::clone(&entry)));
        Some(entry)
    }

    fn update(&mut self, mutate: impl FnOnce(&mut StoreSnapshot)) {
        self.state.send_modify(|state| {
            mutate(state);
            state.rev += 1;
        });
        self.persist();
    }

    fn persist(&mut self) {
        let persisted = self.state.borrow().to_persisted();
        match self.backend.save(&persisted) {
            Ok(()) => self.last_persist_error = None,
            Err(err) => {
                warn!(error = %err, "failed to persist content store snapshot");
                self.last_persist_error = Some(err);
            }
        }
    }
}
