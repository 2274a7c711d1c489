use crate::metrics::Metrics;
use crate::models::{
    BatchOutcome, BatchRequest, FileDecision, FileEntry, MAX_CONCURRENT_BATCHES, ProgressEvent,
    ValidationError, percent_of,
};
use crate::services::file_ops::{self, FileOpStatus, FileOperationError};
use crate::services::scanner::{self, ScanError};
use crate::services::substitution::plan_destination;
use camino::{Utf8Path, Utf8PathBuf};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, mpsc, oneshot, watch};
use tokio::task::JoinHandle;

/// Status line emitted when a batch begins.
pub const STARTED_STATUS: &str = "Started...";

/// Reasons a batch never starts. Raised synchronously by [`RenameEngine::start`],
/// before any background work exists.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("A batch is already running")]
    AlreadyRunning,
}

/// Events produced by a running batch, delivered in processing order.
#[derive(Debug)]
pub enum BatchEvent {
    /// Lifecycle status text ("Started...", "Completed: 3 files", ...)
    Status(String),

    /// A file is about to be processed
    Progress(ProgressEvent),

    /// A file was moved, copied or left unchanged
    FileProcessed {
        plan_index: usize,
        original: Utf8PathBuf,
        destination: Utf8PathBuf,
        status: FileOpStatus,
    },

    /// A file failed and the batch is waiting for a decision
    FileError(FileErrorPrompt),

    /// A failed file was skipped after a Continue decision
    FileSkipped {
        plan_index: usize,
        original: Utf8PathBuf,
        error: String,
    },

    /// Always the last event of a batch
    Done(BatchOutcome),
}

/// A pending Continue/Abort question for one failed file.
///
/// The worker does not touch another file until [`respond`](Self::respond)
/// is called. Dropping the prompt unanswered counts as Abort.
#[derive(Debug)]
pub struct FileErrorPrompt {
    pub plan_index: usize,
    pub original: Utf8PathBuf,
    pub destination: Utf8PathBuf,
    pub error: String,
    responder: oneshot::Sender<FileDecision>,
}

impl FileErrorPrompt {
    pub fn respond(self, decision: FileDecision) {
        if self.responder.send(decision).is_err() {
            tracing::debug!("Batch finished before the decision for {} arrived", self.original);
        }
    }
}

/// Cloneable handle that requests cooperative cancellation of a batch.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    fn new() -> (Self, watch::Receiver<bool>) {
        let (tx, rx) = watch::channel(false);
        (Self { tx: Arc::new(tx) }, rx)
    }

    /// Ask the worker to stop at the next file boundary.
    pub fn cancel(&self) {
        tracing::info!("Cancellation requested");
        // send_replace works even when the worker already exited
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Coordinator side of a running batch.
pub struct BatchHandle {
    events: mpsc::UnboundedReceiver<BatchEvent>,
    cancel: CancelHandle,
    task: JoinHandle<BatchOutcome>,
    total_files: usize,
}

impl BatchHandle {
    pub fn total_files(&self) -> usize {
        self.total_files
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Next event, or `None` once the worker has finished and every event
    /// has been received.
    pub async fn next_event(&mut self) -> Option<BatchEvent> {
        self.events.recv().await
    }

    /// Wait for the worker and return its outcome.
    pub async fn join(self) -> BatchOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Batch worker failed: {}", e);
                BatchOutcome::aborted_on_error(e)
            }
        }
    }

    /// Drain all events, answering file errors with `decide`.
    pub async fn finish_with<F>(mut self, mut decide: F) -> BatchOutcome
    where
        F: FnMut(&FileErrorPrompt) -> FileDecision,
    {
        while let Some(event) = self.next_event().await {
            if let BatchEvent::FileError(prompt) = event {
                let decision = decide(&prompt);
                prompt.respond(decision);
            }
        }
        self.join().await
    }
}

/// The rename/copy engine.
///
/// Validation and scanning happen synchronously in [`start`](Self::start), so
/// a bad request or unreadable directory is reported to the caller without
/// any background task. The files are then processed one at a time on a
/// tokio task, in scan order.
///
/// # Example
/// ```ignore
/// let engine = RenameEngine::new();
/// let request = BatchRequest::new("/photos", "IMG", "PHOTO", BatchMode::Move);
/// let handle = engine.start(request)?;
/// let outcome = handle.finish_with(|_| FileDecision::Continue).await;
/// ```
pub struct RenameEngine {
    metrics: Arc<Metrics>,
    batch_slots: Arc<Semaphore>,
}

impl RenameEngine {
    pub fn new() -> Self {
        Self::with_metrics(Arc::new(Metrics::new()))
    }

    pub fn with_metrics(metrics: Arc<Metrics>) -> Self {
        Self {
            metrics,
            batch_slots: Arc::new(Semaphore::new(MAX_CONCURRENT_BATCHES)),
        }
    }

    pub fn metrics(&self) -> Arc<Metrics> {
        Arc::clone(&self.metrics)
    }

    /// True while a batch started by this engine has not finished.
    pub fn is_busy(&self) -> bool {
        self.batch_slots.available_permits() == 0
    }

    /// Validate `request`, scan its directory and spawn the worker.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self, request: BatchRequest) -> Result<BatchHandle, EngineError> {
        let permit = Arc::clone(&self.batch_slots)
            .try_acquire_owned()
            .map_err(|_| EngineError::AlreadyRunning)?;

        request.validate()?;
        let files = scanner::scan_directory(&request.source_directory)?;

        Ok(self.spawn_worker(request, files, permit))
    }

    /// Start a batch over an already scanned snapshot.
    pub fn start_with_files(
        &self,
        request: BatchRequest,
        files: Vec<FileEntry>,
    ) -> Result<BatchHandle, EngineError> {
        let permit = Arc::clone(&self.batch_slots)
            .try_acquire_owned()
            .map_err(|_| EngineError::AlreadyRunning)?;

        request.validate()?;

        Ok(self.spawn_worker(request, files, permit))
    }

    fn spawn_worker(
        &self,
        request: BatchRequest,
        files: Vec<FileEntry>,
        permit: OwnedSemaphorePermit,
    ) -> BatchHandle {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (cancel, cancel_rx) = CancelHandle::new();
        let total_files = files.len();
        let metrics = Arc::clone(&self.metrics);

        tracing::info!(
            "Starting batch: {} files in {}, '{}' -> '{}', mode={:?}, scope={:?}",
            total_files,
            request.source_directory,
            request.search_pattern,
            request.replace_pattern,
            request.mode,
            request.scope
        );

        let task = tokio::spawn(async move {
            let worker = BatchWorker {
                request,
                files,
                events: events_tx,
                cancel_rx,
                metrics,
            };
            let outcome = worker.run().await;
            drop(permit);
            outcome
        });

        BatchHandle {
            events: events_rx,
            cancel,
            task,
            total_files,
        }
    }
}

impl Default for RenameEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// State owned by the background task for the duration of one batch.
struct BatchWorker {
    request: BatchRequest,
    files: Vec<FileEntry>,
    events: mpsc::UnboundedSender<BatchEvent>,
    cancel_rx: watch::Receiver<bool>,
    metrics: Arc<Metrics>,
}

impl BatchWorker {
    fn emit(&self, event: BatchEvent) {
        // Nobody listening is fine; the outcome is still returned from the task
        let _ = self.events.send(event);
    }

    fn cancel_requested(&self) -> bool {
        *self.cancel_rx.borrow()
    }

    async fn run(mut self) -> BatchOutcome {
        self.metrics.record_batch_started();
        self.emit(BatchEvent::Status(STARTED_STATUS.to_string()));

        let outcome = self.process_files().await;

        match &outcome {
            BatchOutcome::Completed { count } => {
                self.metrics.record_batch_completed();
                tracing::info!("Batch completed: {} files attempted", count);
            }
            BatchOutcome::Cancelled { reason } => {
                self.metrics.record_batch_cancelled();
                tracing::warn!("Batch cancelled: {}", reason);
            }
        }
        self.metrics.log_summary();

        self.emit(BatchEvent::Status(outcome.status_message()));
        self.emit(BatchEvent::Done(outcome.clone()));
        outcome
    }

    async fn process_files(&mut self) -> BatchOutcome {
        let total = self.files.len();
        let mut attempted = 0usize;

        for index in 0..total {
            if self.cancel_requested() {
                tracing::info!("Cancellation observed after {} of {} files", attempted, total);
                return BatchOutcome::cancelled_by_user();
            }

            let plan = plan_destination(
                &self.files[index],
                &self.request.search_pattern,
                &self.request.replace_pattern,
                self.request.scope,
            );

            self.emit(BatchEvent::Progress(ProgressEvent {
                plan_index: index,
                total,
                original: plan.original.path().to_path_buf(),
                destination: plan.destination.clone(),
                percent_complete: percent_of(index + 1, total),
            }));

            tracing::debug!(
                "{} file {}/{}: {} => {}",
                self.request.mode.verb(),
                index + 1,
                total,
                plan.original.path(),
                plan.destination
            );

            let started = Instant::now();
            match file_ops::execute(&plan, self.request.mode).await {
                Ok(status) => {
                    self.metrics.record_file_status(status);
                    self.metrics.record_operation_time(started.elapsed());
                    self.emit(BatchEvent::FileProcessed {
                        plan_index: index,
                        original: plan.original.path().to_path_buf(),
                        destination: plan.destination.clone(),
                        status,
                    });
                }
                Err(error) => {
                    self.metrics.record_file_failed();
                    tracing::warn!(
                        "{} {} failed: {}",
                        self.request.mode.verb(),
                        plan.original.path(),
                        error
                    );

                    let original = plan.original.path().to_path_buf();
                    match self
                        .await_decision(index, original, &plan.destination, &error)
                        .await
                    {
                        Some(FileDecision::Continue) => {
                            self.metrics.record_file_skipped();
                            tracing::info!("Skipping {} and continuing", plan.original.path());
                            self.emit(BatchEvent::FileSkipped {
                                plan_index: index,
                                original: plan.original.path().to_path_buf(),
                                error: error.to_string(),
                            });
                        }
                        Some(FileDecision::Abort) => {
                            tracing::error!("Batch aborted on {}: {}", plan.original.path(), error);
                            return BatchOutcome::aborted_on_error(&error);
                        }
                        None => return BatchOutcome::cancelled_by_user(),
                    }
                }
            }

            attempted += 1;
        }

        BatchOutcome::Completed { count: attempted }
    }

    /// Ask the coordinator what to do about a failed file.
    ///
    /// Returns `None` when the batch is cancelled while waiting.
    async fn await_decision(
        &mut self,
        plan_index: usize,
        original: Utf8PathBuf,
        destination: &Utf8Path,
        error: &FileOperationError,
    ) -> Option<FileDecision> {
        let (responder, decision_rx) = oneshot::channel();
        self.emit(BatchEvent::FileError(FileErrorPrompt {
            plan_index,
            original: original.clone(),
            destination: destination.to_path_buf(),
            error: error.to_string(),
            responder,
        }));

        tokio::select! {
            decision = decision_rx => match decision {
                Ok(decision) => Some(decision),
                Err(_) => {
                    tracing::warn!("No decision received for {}, aborting", original);
                    Some(FileDecision::Abort)
                }
            },
            _ = wait_for_cancel(&mut self.cancel_rx) => None,
        }
    }
}

/// Resolves once cancellation has been requested. Never resolves if the
/// cancel handle is dropped without cancelling.
async fn wait_for_cancel(cancel_rx: &mut watch::Receiver<bool>) {
    loop {
        if *cancel_rx.borrow_and_update() {
            return;
        }
        if cancel_rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
