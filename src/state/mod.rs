// State management module
//
// This module provides the StateManager which wraps AppState with thread-safe access
// using Arc<RwLock<T>> and emits change events to whoever renders the batch.

use crate::models::{AppState, BatchMode, BatchOutcome, FileStatus, ProgressEvent, UserConfig};
use camino::Utf8PathBuf;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

/// Change events emitted when state is modified
#[derive(Clone, Debug, PartialEq)]
pub enum StateChange {
    /// Directory, patterns or mode changed
    SelectionChanged { can_start: bool },

    /// A batch has started
    BatchStarted { total_files: usize },

    /// Progress moved on to another file
    ProgressUpdated {
        current: usize,
        total: usize,
        percent: u8,
        current_file: Option<Utf8PathBuf>,
    },

    /// The status line changed
    StatusChanged { message: String },

    /// A file has been dealt with
    FileProcessed {
        original: Utf8PathBuf,
        status: FileStatus,
    },

    /// The batch has terminated
    BatchFinished { outcome: BatchOutcome },

    /// State has been reset
    StateReset,
}

/// Thread-safe state manager with event emission
///
/// - Provides thread-safe access to [`AppState`] via `Arc<RwLock<T>>`
/// - Detects state changes and emits [`StateChange`] events
/// - Supports subscribing to state changes via tokio broadcast channels
///
/// Always go through `StateManager` instead of touching [`AppState`]:
/// [`read()`](Self::read) for reading, [`update()`](Self::update) for
/// mutations with automatic event emission, [`subscribe()`](Self::subscribe)
/// for listening.
pub struct StateManager {
    state: Arc<RwLock<AppState>>,

    /// Broadcast channel for emitting state change events
    state_tx: broadcast::Sender<StateChange>,
}

impl StateManager {
    /// Create a new StateManager with default state and a 256 event buffer
    pub fn new() -> Self {
        let (state_tx, _) = broadcast::channel(256);
        Self {
            state: Arc::new(RwLock::new(AppState::default())),
            state_tx,
        }
    }

    /// Clone of the current state, safe to use without holding locks
    pub fn snapshot(&self) -> AppState {
        self.state.read().unwrap().clone()
    }

    /// Execute a function with read access to the state
    ///
    /// # Example
    /// ```ignore
    /// let running = state_manager.read(|state| state.is_running);
    /// ```
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&AppState) -> R,
    {
        let state = self.state.read().unwrap();
        f(&state)
    }

    /// Update the state and emit change events
    ///
    /// Captures the old state, applies `update_fn`, then emits one event per
    /// detected difference. Returns the emitted events.
    pub fn update<F>(&self, update_fn: F) -> Vec<StateChange>
    where
        F: FnOnce(&mut AppState),
    {
        let mut state = self.state.write().unwrap();
        let old_state = state.clone();

        update_fn(&mut state);

        let changes = self.detect_changes(&old_state, &state);

        for change in &changes {
            // Ignore send errors - it's OK if no one is listening
            let _ = self.state_tx.send(change.clone());
        }

        changes
    }

    /// Subscribe to state change events
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.state_tx.subscribe()
    }

    fn detect_changes(&self, old: &AppState, new: &AppState) -> Vec<StateChange> {
        let mut changes = Vec::new();

        if old.directory != new.directory
            || old.search_pattern != new.search_pattern
            || old.replace_pattern != new.replace_pattern
            || old.mode != new.mode
            || (old.is_running != new.is_running)
        {
            changes.push(StateChange::SelectionChanged {
                can_start: new.can_start(),
            });
        }

        if old.is_running != new.is_running && new.is_running {
            changes.push(StateChange::BatchStarted {
                total_files: new.total_files,
            });
        }

        if old.progress != new.progress
            || old.total_files != new.total_files
            || old.current_file != new.current_file
            || old.percent_complete != new.percent_complete
        {
            changes.push(StateChange::ProgressUpdated {
                current: new.progress,
                total: new.total_files,
                percent: new.percent_complete,
                current_file: new.current_file.clone(),
            });
        }

        if old.status_message != new.status_message {
            changes.push(StateChange::StatusChanged {
                message: new.status_message.clone(),
            });
        }

        if old.last_outcome != new.last_outcome {
            if let Some(outcome) = &new.last_outcome {
                changes.push(StateChange::BatchFinished {
                    outcome: outcome.clone(),
                });
            }
        }

        changes
    }

    // Convenience methods for common state updates

    /// Select the source directory. Clears the status line, as opening a new
    /// directory does in the desktop version.
    pub fn set_directory(&self, directory: Option<Utf8PathBuf>) -> Vec<StateChange> {
        self.update(|state| {
            state.directory = directory;
            state.percent_complete = 0;
            state.status_message = " ".to_string();
        })
    }

    pub fn set_patterns(&self, search: String, replace: String) -> Vec<StateChange> {
        self.update(|state| {
            state.search_pattern = search;
            state.replace_pattern = replace;
        })
    }

    /// Show a message on the status line
    pub fn set_status(&self, message: impl Into<String>) -> Vec<StateChange> {
        let message = message.into();
        self.update(|state| state.status_message = message)
    }

    /// Mark a batch of `total_files` as running
    pub fn start_batch(&self, total_files: usize) -> Vec<StateChange> {
        self.update(|state| {
            state.reset_batch_state();
            state.is_running = true;
            state.total_files = total_files;
        })
    }

    /// Reflect the file the engine is about to process
    pub fn apply_progress(&self, event: &ProgressEvent) -> Vec<StateChange> {
        self.update(|state| {
            state.current_file = Some(event.original.clone());
            state.total_files = event.total;
            state.percent_complete = event.percent_complete;
            state.status_message = event.status_line();
        })
    }

    /// Record what happened to one file
    pub fn add_file_result(&self, original: Utf8PathBuf, status: FileStatus) -> Vec<StateChange> {
        let mut changes = self.update(|state| {
            state.add_result(original.clone(), status.clone());
        });

        let event = StateChange::FileProcessed { original, status };
        let _ = self.state_tx.send(event.clone());
        changes.push(event);

        changes
    }

    /// Mark the batch as finished with `outcome`
    pub fn finish_batch(&self, outcome: BatchOutcome) -> Vec<StateChange> {
        self.update(|state| {
            state.is_running = false;
            state.current_file = None;
            state.status_message = outcome.status_message();
            if !outcome.is_completed() {
                state.percent_complete = 0;
            }
            state.last_outcome = Some(outcome);
        })
    }

    /// Reset all batch-related state
    pub fn reset_batch_state(&self) -> Vec<StateChange> {
        let mut changes = self.update(|state| state.reset_batch_state());

        let reset_event = StateChange::StateReset;
        let _ = self.state_tx.send(reset_event.clone());
        changes.push(reset_event);

        changes
    }

    /// Populate the selection from persisted preferences
    pub fn load_from_user_config(&self, user_config: &UserConfig) -> Vec<StateChange> {
        self.update(|state| {
            state.directory = user_config.last_directory.clone();
            state.search_pattern = user_config.default_search.clone();
            state.mode = BatchMode::from_copy_flag(user_config.copy_by_default);

            tracing::info!(
                "Loaded user config: last_directory={:?}, search='{}', mode={:?}",
                state.directory,
                state.search_pattern,
                state.mode
            );
        })
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for StateManager {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            state_tx: self.state_tx.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::INITIAL_STATUS;

    fn progress(index: usize, total: usize, percent: u8) -> ProgressEvent {
        ProgressEvent {
            plan_index: index,
            total,
            original: Utf8PathBuf::from(format!("/p/IMG_{}.jpg", index)),
            destination: Utf8PathBuf::from(format!("/p/PHOTO_{}.jpg", index)),
            percent_complete: percent,
        }
    }

    #[test]
    fn test_new_state_manager() {
        let manager = StateManager::new();
        let state = manager.snapshot();

        assert!(!state.is_running);
        assert_eq!(state.progress, 0);
        assert_eq!(state.status_message, INITIAL_STATUS);
    }

    #[test]
    fn test_selection_changes() {
        let manager = StateManager::new();

        manager.set_directory(Some(Utf8PathBuf::from("/photos")));
        let changes = manager.set_patterns("IMG".to_string(), "PHOTO".to_string());

        assert_eq!(changes, vec![StateChange::SelectionChanged { can_start: true }]);
    }

    #[test]
    fn test_start_batch() {
        let manager = StateManager::new();
        let changes = manager.start_batch(3);

        assert!(changes.iter().any(|c| matches!(c, StateChange::BatchStarted { total_files: 3 })));
        assert!(changes.iter().any(|c| matches!(c, StateChange::ProgressUpdated { total: 3, .. })));
        assert!(manager.read(|s| s.is_running));
    }

    #[test]
    fn test_apply_progress_sets_status_line() {
        let manager = StateManager::new();
        manager.start_batch(2);

        let changes = manager.apply_progress(&progress(0, 2, 50));

        assert!(changes.iter().any(|c| matches!(c, StateChange::ProgressUpdated { percent: 50, .. })));
        assert!(changes.iter().any(|c| matches!(
            c,
            StateChange::StatusChanged { message } if message == "/p/IMG_0.jpg => /p/PHOTO_0.jpg"
        )));
    }

    #[test]
    fn test_add_file_result() {
        let manager = StateManager::new();
        manager.start_batch(1);

        let changes = manager.add_file_result(Utf8PathBuf::from("/p/IMG_0.jpg"), FileStatus::Unchanged);

        assert!(changes.iter().any(|c| matches!(c, StateChange::FileProcessed { .. })));
        assert_eq!(manager.read(|s| s.progress), 1);
    }

    #[test]
    fn test_finish_batch() {
        let manager = StateManager::new();
        manager.start_batch(2);

        let changes = manager.finish_batch(BatchOutcome::Completed { count: 2 });

        assert!(changes.iter().any(|c| matches!(
            c,
            StateChange::BatchFinished { outcome: BatchOutcome::Completed { count: 2 } }
        )));

        let state = manager.snapshot();
        assert!(!state.is_running);
        assert_eq!(state.status_message, "Completed: 2 files");
    }

    #[test]
    fn test_cancelled_batch_resets_percent() {
        let manager = StateManager::new();
        manager.start_batch(2);
        manager.apply_progress(&progress(0, 2, 50));

        manager.finish_batch(BatchOutcome::cancelled_by_user());

        let state = manager.snapshot();
        assert_eq!(state.percent_complete, 0);
        assert_eq!(state.status_message, "Cancelled");
    }

    #[test]
    fn test_reset_batch_state() {
        let manager = StateManager::new();
        manager.start_batch(1);
        manager.add_file_result(Utf8PathBuf::from("/p/a.jpg"), FileStatus::Unchanged);

        let changes = manager.reset_batch_state();

        assert!(changes.iter().any(|c| matches!(c, StateChange::StateReset)));
        let state = manager.snapshot();
        assert!(state.results.is_empty());
        assert_eq!(state.total_files, 0);
    }

    #[test]
    fn test_load_from_user_config() {
        let manager = StateManager::new();
        let config = UserConfig {
            last_directory: Some(Utf8PathBuf::from("/photos")),
            copy_by_default: true,
            ..UserConfig::default()
        };

        manager.load_from_user_config(&config);

        let state = manager.snapshot();
        assert_eq!(state.directory, Some(Utf8PathBuf::from("/photos")));
        assert_eq!(state.search_pattern, "IMG");
        assert_eq!(state.mode, BatchMode::Copy);
    }

    #[test]
    fn test_subscribe_to_changes() {
        let manager = StateManager::new();
        let mut rx = manager.subscribe();

        manager.set_status("Started...");

        let event = rx.try_recv().unwrap();
        assert_eq!(
            event,
            StateChange::StatusChanged {
                message: "Started...".to_string()
            }
        );
    }

    #[test]
    fn test_clone_shares_state() {
        let manager1 = StateManager::new();
        let manager2 = manager1.clone();

        manager1.start_batch(5);

        assert_eq!(manager2.read(|s| s.total_files), 5);
    }
}
