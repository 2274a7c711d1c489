use crate::models::{ErrorPolicy, FileDecision};
use camino::Utf8Path;
use std::sync::Arc;

/// Decides whether a batch goes on after a file fails.
///
/// Called off the async workers (via `spawn_blocking`), so implementations
/// are free to block on user input.
#[cfg_attr(test, mockall::automock)]
pub trait ErrorResolver: Send + Sync {
    fn resolve(&self, path: &Utf8Path, error: &str) -> FileDecision;
}

/// Answers every failure the same way.
#[derive(Debug, Clone, Copy)]
pub struct PolicyResolver {
    decision: FileDecision,
}

impl PolicyResolver {
    pub fn new(decision: FileDecision) -> Self {
        Self { decision }
    }
}

impl ErrorResolver for PolicyResolver {
    fn resolve(&self, path: &Utf8Path, error: &str) -> FileDecision {
        tracing::warn!("{}: {} ({:?} by policy)", path, error, self.decision);
        self.decision
    }
}

/// Asks the user with a native OK/Cancel message box.
#[derive(Debug, Clone, Copy, Default)]
pub struct DialogResolver;

impl ErrorResolver for DialogResolver {
    fn resolve(&self, path: &Utf8Path, error: &str) -> FileDecision {
        use rfd::{MessageButtons, MessageDialog, MessageDialogResult, MessageLevel};

        let answer = MessageDialog::new()
            .set_level(MessageLevel::Error)
            .set_title("Error")
            .set_description(format!("{}\n\n{}\n\nDo you wish to continue?", path, error))
            .set_buttons(MessageButtons::OkCancel)
            .show();

        let decision = match answer {
            MessageDialogResult::Ok | MessageDialogResult::Yes => FileDecision::Continue,
            _ => FileDecision::Abort,
        };
        tracing::info!("User chose {:?} after error on {}", decision, path);
        decision
    }
}

/// Resolver matching a configured [`ErrorPolicy`].
pub fn resolver_for(policy: ErrorPolicy) -> Arc<dyn ErrorResolver> {
    match policy {
        ErrorPolicy::Ask => Arc::new(DialogResolver),
        ErrorPolicy::Continue => Arc::new(PolicyResolver::new(FileDecision::Continue)),
        ErrorPolicy::Abort => Arc::new(PolicyResolver::new(FileDecision::Abort)),
    }
}
