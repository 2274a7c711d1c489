use crate::models::{BatchMode, BatchOutcome};
use camino::Utf8PathBuf;
use indexmap::IndexMap;

/// Maximum number of batches that may run at the same time.
///
/// Two batches against the same directory would race on the same files, so
/// the coordinator refuses to start a second one while this many are active.
pub const MAX_CONCURRENT_BATCHES: usize = 1;

/// Status line shown before anything has been selected.
pub const INITIAL_STATUS: &str = "Select a directory...";

/// What happened to a single file in the current batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    /// Moved or copied to the given destination.
    Done { destination: Utf8PathBuf },
    /// Search pattern absent; nothing to do.
    Unchanged,
    /// The operation failed and the user chose to continue.
    Skipped { error: String },
    /// The operation failed and ended the batch.
    Failed { error: String },
}

/// Single source of truth for coordinator-side state.
///
/// Wrapped in `Arc<RwLock<AppState>>` by [`crate::state::StateManager`]; go
/// through its `read()` / `update()` methods rather than touching it directly.
#[derive(Clone, Debug)]
pub struct AppState {
    // Selection
    pub directory: Option<Utf8PathBuf>,
    pub search_pattern: String,
    pub replace_pattern: String,
    pub mode: BatchMode,

    // Runtime state
    pub is_running: bool,
    pub current_file: Option<Utf8PathBuf>,
    pub status_message: String,

    // Progress state
    pub progress: usize,
    pub total_files: usize,
    pub percent_complete: u8,

    // Results, in processing order
    pub results: IndexMap<Utf8PathBuf, FileStatus>,
    pub last_outcome: Option<BatchOutcome>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            directory: None,
            search_pattern: String::new(),
            replace_pattern: String::new(),
            mode: BatchMode::Move,

            is_running: false,
            current_file: None,
            status_message: INITIAL_STATUS.to_string(),

            progress: 0,
            total_files: 0,
            percent_complete: 0,

            results: IndexMap::new(),
            last_outcome: None,
        }
    }
}

impl AppState {
    /// A batch can start when a directory is chosen, both patterns are
    /// filled in and nothing else is running.
    pub fn can_start(&self) -> bool {
        self.directory.is_some()
            && !self.search_pattern.is_empty()
            && !self.replace_pattern.is_empty()
            && !self.is_running
    }

    /// Returns (processed, unchanged, skipped, failed).
    pub fn batch_stats(&self) -> (usize, usize, usize, usize) {
        let mut processed = 0;
        let mut unchanged = 0;
        let mut skipped = 0;
        let mut failed = 0;
        for status in self.results.values() {
            match status {
                FileStatus::Done { .. } => processed += 1,
                FileStatus::Unchanged => unchanged += 1,
                FileStatus::Skipped { .. } => skipped += 1,
                FileStatus::Failed { .. } => failed += 1,
            }
        }
        (processed, unchanged, skipped, failed)
    }

    /// Record a per-file result and advance the attempted counter.
    pub fn add_result(&mut self, original: Utf8PathBuf, status: FileStatus) {
        self.results.insert(original, status);
        self.progress = self.results.len();
    }

    /// Reset all batch-related state, keeping the current selection.
    pub fn reset_batch_state(&mut self) {
        self.is_running = false;
        self.current_file = None;
        self.progress = 0;
        self.total_files = 0;
        self.percent_complete = 0;
        self.results.clear();
        self.last_outcome = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state() {
        let state = AppState::default();
        assert!(!state.is_running);
        assert!(!state.can_start());
        assert_eq!(state.status_message, INITIAL_STATUS);
        assert_eq!(state.batch_stats(), (0, 0, 0, 0));
    }

    #[test]
    fn test_can_start_requires_selection() {
        let mut state = AppState {
            directory: Some(Utf8PathBuf::from("/photos")),
            search_pattern: "IMG".to_string(),
            ..AppState::default()
        };
        assert!(!state.can_start());

        state.replace_pattern = "PHOTO".to_string();
        assert!(state.can_start());

        state.is_running = true;
        assert!(!state.can_start());
    }

    #[test]
    fn test_add_result_keeps_processing_order() {
        let mut state = AppState::default();
        state.add_result(
            Utf8PathBuf::from("/p/b.jpg"),
            FileStatus::Done {
                destination: Utf8PathBuf::from("/p/x.jpg"),
            },
        );
        state.add_result(Utf8PathBuf::from("/p/a.jpg"), FileStatus::Unchanged);
        state.add_result(
            Utf8PathBuf::from("/p/c.jpg"),
            FileStatus::Skipped {
                error: "exists".to_string(),
            },
        );

        let order: Vec<&str> = state.results.keys().map(|p| p.as_str()).collect();
        assert_eq!(order, vec!["/p/b.jpg", "/p/a.jpg", "/p/c.jpg"]);
        assert_eq!(state.progress, 3);
        assert_eq!(state.batch_stats(), (1, 1, 1, 0));
    }

    #[test]
    fn test_reset_batch_state_keeps_selection() {
        let mut state = AppState {
            directory: Some(Utf8PathBuf::from("/photos")),
            is_running: true,
            total_files: 4,
            progress: 2,
            ..AppState::default()
        };
        state.reset_batch_state();

        assert!(!state.is_running);
        assert_eq!(state.total_files, 0);
        assert_eq!(state.progress, 0);
        assert_eq!(state.directory, Some(Utf8PathBuf::from("/photos")));
    }
}
