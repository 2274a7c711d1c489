// Batch Controller - Bridges the rename engine with state and the terminal
//
// This module contains the BatchController which coordinates between:
// - RenameEngine (background batch worker)
// - StateManager (application state)
// - ConfigManager (remembered directory)
// - ErrorResolver (per-file Continue/Abort decisions)
// - BatchProgress (terminal progress bar)

use crate::config::ConfigManager;
use crate::models::{BatchOutcome, BatchRequest, FileDecision, FileStatus};
use crate::services::file_ops::FileOpStatus;
use crate::services::{BatchEvent, CancelHandle, EngineError, FileErrorPrompt, RenameEngine};
use crate::state::StateManager;
use crate::ui::progress::BatchProgress;
use crate::ui::resolver::ErrorResolver;
use std::sync::{Arc, Mutex};

/// Coordinator for one rename/copy batch at a time.
///
/// It:
/// - Validates requests before the engine is involved
/// - Forwards engine events, in order, into [`StateManager`] and the progress bar
/// - Hands per-file failures to an [`ErrorResolver`] and answers the engine
/// - Exposes [`cancel()`](Self::cancel) for Ctrl-C
///
/// # Example
/// ```ignore
/// let state = Arc::new(StateManager::new());
/// let controller = BatchController::new(state, resolver_for(ErrorPolicy::Ask))
///     .with_config(Arc::new(ConfigManager::new(default_config_dir())?))
///     .with_progress_bar(true);
///
/// let outcome = controller
///     .run_batch(BatchRequest::new("/photos", "IMG", "PHOTO", BatchMode::Move))
///     .await?;
/// ```
pub struct BatchController {
    state_manager: Arc<StateManager>,
    engine: RenameEngine,
    resolver: Arc<dyn ErrorResolver>,
    config_manager: Option<Arc<ConfigManager>>,
    show_progress: bool,

    active: Mutex<ActiveBatch>,
}

/// Cancellation bookkeeping shared with Ctrl-C.
#[derive(Debug, Default)]
struct ActiveBatch {
    handle: Option<CancelHandle>,
    /// Set when cancel arrives before the worker's handle is stored
    cancel_pending: bool,
}

impl BatchController {
    pub fn new(state_manager: Arc<StateManager>, resolver: Arc<dyn ErrorResolver>) -> Self {
        Self {
            state_manager,
            engine: RenameEngine::new(),
            resolver,
            config_manager: None,
            show_progress: false,
            active: Mutex::new(ActiveBatch::default()),
        }
    }

    /// Remember each started batch's directory through `config_manager`.
    pub fn with_config(mut self, config_manager: Arc<ConfigManager>) -> Self {
        self.config_manager = Some(config_manager);
        self
    }

    /// Run batches on `engine`, e.g. one sharing a metrics instance.
    pub fn with_engine(mut self, engine: RenameEngine) -> Self {
        self.engine = engine;
        self
    }

    /// Draw an indicatif progress bar while the batch runs.
    pub fn with_progress_bar(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn state(&self) -> &Arc<StateManager> {
        &self.state_manager
    }

    pub fn is_running(&self) -> bool {
        self.engine.is_busy()
    }

    /// Request cancellation of the running batch.
    ///
    /// Returns false when nothing is running. The request is then held and
    /// applied to the next batch as soon as it starts, so a Ctrl-C that lands
    /// while a batch is starting still stops it.
    pub fn cancel(&self) -> bool {
        let mut active = self.active.lock().unwrap();
        match active.handle.as_ref() {
            Some(handle) if handle.is_cancelled() => {
                tracing::debug!("Cancellation already requested");
                true
            }
            Some(handle) => {
                handle.cancel();
                true
            }
            None => {
                tracing::debug!("Cancel requested with no batch running, holding it");
                active.cancel_pending = true;
                false
            }
        }
    }

    /// Run one batch to completion.
    ///
    /// Boundary failures (invalid request, unreadable directory, a batch
    /// already running) are returned as errors after being shown on the
    /// status line. Everything after the start ends in a [`BatchOutcome`].
    pub async fn run_batch(&self, request: BatchRequest) -> Result<BatchOutcome, EngineError> {
        self.state_manager.update(|state| {
            state.directory = Some(request.source_directory.clone());
            state.search_pattern = request.search_pattern.clone();
            state.replace_pattern = request.replace_pattern.clone();
            state.mode = request.mode;
        });

        if let Err(e) = request.validate() {
            tracing::error!("Cannot start batch: {}", e);
            self.state_manager.set_status(format!("Error: {}", e));
            return Err(e.into());
        }

        let mut handle = match self.engine.start(request.clone()) {
            Ok(handle) => handle,
            Err(e) => {
                tracing::error!("Cannot start batch: {}", e);
                // A running batch keeps its own status line
                if !matches!(e, EngineError::AlreadyRunning) {
                    self.state_manager.set_status(format!("Error: {}", e));
                }
                return Err(e);
            }
        };

        {
            let mut active = self.active.lock().unwrap();
            let cancel = handle.cancel_handle();
            if std::mem::take(&mut active.cancel_pending) {
                tracing::info!("Applying cancellation requested while the batch was starting");
                cancel.cancel();
            }
            active.handle = Some(cancel);
        }

        if let Some(config_manager) = &self.config_manager {
            config_manager.remember_directory(&request.source_directory);
        }

        let total_files = handle.total_files();
        self.state_manager.start_batch(total_files);

        let progress = if self.show_progress {
            BatchProgress::new(request.mode.verb(), total_files)
        } else {
            BatchProgress::hidden()
        };

        while let Some(event) = handle.next_event().await {
            self.handle_event(event, &progress).await;
        }

        let outcome = handle.join().await;
        *self.active.lock().unwrap() = ActiveBatch::default();

        self.state_manager.finish_batch(outcome.clone());
        progress.finish(&outcome);

        Ok(outcome)
    }

    async fn handle_event(&self, event: BatchEvent, progress: &BatchProgress) {
        match event {
            BatchEvent::Status(message) => {
                progress.set_status(&message);
                self.state_manager.set_status(message);
            }
            BatchEvent::Progress(event) => {
                progress.update(&event);
                self.state_manager.apply_progress(&event);
            }
            BatchEvent::FileProcessed {
                original,
                destination,
                status,
                ..
            } => {
                let status = match status {
                    FileOpStatus::Unchanged => FileStatus::Unchanged,
                    FileOpStatus::Moved | FileOpStatus::Copied => FileStatus::Done { destination },
                };
                self.state_manager.add_file_result(original, status);
            }
            BatchEvent::FileError(prompt) => {
                progress.println(format!("Error: {}", prompt.error));
                self.resolve(prompt).await;
            }
            BatchEvent::FileSkipped { original, error, .. } => {
                self.state_manager
                    .add_file_result(original, FileStatus::Skipped { error });
            }
            BatchEvent::Done(outcome) => {
                tracing::debug!("Batch reported {:?}", outcome);
            }
        }
    }

    async fn resolve(&self, prompt: FileErrorPrompt) {
        let resolver = Arc::clone(&self.resolver);
        let path = prompt.original.clone();
        let error = prompt.error.clone();

        let decision = tokio::task::spawn_blocking(move || resolver.resolve(&path, &error))
            .await
            .unwrap_or_else(|e| {
                tracing::error!("Error resolver failed: {}", e);
                FileDecision::Abort
            });

        if decision == FileDecision::Abort {
            self.state_manager.add_file_result(
                prompt.original.clone(),
                FileStatus::Failed {
                    error: prompt.error.clone(),
                },
            );
        }

        prompt.respond(decision);
    }
}
