use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Whether the batch renames files in place or leaves the originals behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchMode {
    #[default]
    Move,
    Copy,
}

impl BatchMode {
    pub fn from_copy_flag(copy: bool) -> Self {
        if copy { Self::Copy } else { Self::Move }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            Self::Move => "Renaming",
            Self::Copy => "Copying",
        }
    }
}

/// Which part of the path the search pattern is substituted in.
///
/// `FileName` only touches the final path component. `FullPath` applies the
/// substitution to the whole stringified path, so a match in a parent
/// directory changes where the file ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubstitutionScope {
    #[default]
    FileName,
    FullPath,
}

/// Rejections raised before a batch is allowed to start.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("No directory selected")]
    NoDirectory,

    #[error("{0} is not a directory")]
    NotADirectory(Utf8PathBuf),

    #[error("Please provide a search pattern")]
    EmptySearchPattern,

    #[error("Please provide a replace pattern")]
    EmptyReplacePattern,
}

/// Everything the engine needs to run one batch.
///
/// Built once by the coordinator and handed to the engine by value; the
/// engine never reads ambient settings while a batch is in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRequest {
    pub source_directory: Utf8PathBuf,
    pub search_pattern: String,
    pub replace_pattern: String,
    pub mode: BatchMode,
    pub scope: SubstitutionScope,
}

impl BatchRequest {
    pub fn new(
        source_directory: impl Into<Utf8PathBuf>,
        search_pattern: impl Into<String>,
        replace_pattern: impl Into<String>,
        mode: BatchMode,
    ) -> Self {
        Self {
            source_directory: source_directory.into(),
            search_pattern: search_pattern.into(),
            replace_pattern: replace_pattern.into(),
            mode,
            scope: SubstitutionScope::default(),
        }
    }

    pub fn with_scope(mut self, scope: SubstitutionScope) -> Self {
        self.scope = scope;
        self
    }

    /// Check the pattern invariants and that the source directory exists.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.source_directory.as_str().is_empty() {
            return Err(ValidationError::NoDirectory);
        }
        if self.search_pattern.is_empty() {
            return Err(ValidationError::EmptySearchPattern);
        }
        if self.replace_pattern.is_empty() {
            return Err(ValidationError::EmptyReplacePattern);
        }
        if !self.source_directory.is_dir() {
            return Err(ValidationError::NotADirectory(self.source_directory.clone()));
        }
        Ok(())
    }
}

/// A regular file picked up by the scanner. Immutable once enumerated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileEntry {
    path: Utf8PathBuf,
}

impl FileEntry {
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        self.path.file_name().unwrap_or(self.path.as_str())
    }
}

/// Source and computed destination for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenamePlan {
    pub original: FileEntry,
    pub destination: Utf8PathBuf,
}

impl RenamePlan {
    /// True when the search pattern did not occur and nothing would change.
    pub fn is_unchanged(&self) -> bool {
        self.original.path() == self.destination
    }
}

/// Emitted once per file, before its filesystem operation runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub plan_index: usize,
    pub total: usize,
    pub original: Utf8PathBuf,
    pub destination: Utf8PathBuf,
    pub percent_complete: u8,
}

impl ProgressEvent {
    /// Status line text shown while this file is being processed.
    pub fn status_line(&self) -> String {
        format!("{} => {}", self.original, self.destination)
    }
}

/// Integer percentage of `attempted` out of `total`, clamped to 100.
pub fn percent_of(attempted: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    (attempted.min(total) * 100 / total) as u8
}

/// Answer to a per-file operation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileDecision {
    /// Skip the failing file and carry on with the next one.
    Continue,
    /// Stop the batch; remaining files are left untouched.
    Abort,
}

/// Terminal result of a batch. Produced exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    Completed { count: usize },
    Cancelled { reason: String },
}

/// Reason reported when the user stops a batch.
pub const CANCELLED_REASON: &str = "Cancelled";

impl BatchOutcome {
    pub fn cancelled_by_user() -> Self {
        Self::Cancelled {
            reason: CANCELLED_REASON.to_string(),
        }
    }

    pub fn aborted_on_error(error: impl std::fmt::Display) -> Self {
        Self::Cancelled {
            reason: format!("Error: {}", error),
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    /// Final status line for this outcome.
    pub fn status_message(&self) -> String {
        match self {
            Self::Completed { count } => format!("Completed: {} files", count),
            Self::Cancelled { reason } => reason.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_request(search: &str, replace: &str) -> (TempDir, BatchRequest) {
        let temp_dir = TempDir::new().unwrap();
        let dir = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        (temp_dir, BatchRequest::new(dir, search, replace, BatchMode::Move))
    }

    #[test]
    fn test_validate_accepts_complete_request() {
        let (_temp_dir, request) = temp_request("IMG", "PHOTO");
        assert_eq!(request.validate(), Ok(()));
    }

    #[test]
    fn test_validate_rejects_empty_patterns() {
        let (_temp_dir, request) = temp_request("", "PHOTO");
        assert_eq!(request.validate(), Err(ValidationError::EmptySearchPattern));

        let (_temp_dir, request) = temp_request("IMG", "");
        assert_eq!(request.validate(), Err(ValidationError::EmptyReplacePattern));
    }

    #[test]
    fn test_validate_rejects_missing_directory() {
        let request = BatchRequest::new("", "IMG", "PHOTO", BatchMode::Copy);
        assert_eq!(request.validate(), Err(ValidationError::NoDirectory));

        let request = BatchRequest::new("/definitely/not/here", "IMG", "PHOTO", BatchMode::Copy);
        assert!(matches!(
            request.validate(),
            Err(ValidationError::NotADirectory(_))
        ));
    }

    #[test]
    fn test_percent_of() {
        assert_eq!(percent_of(0, 4), 0);
        assert_eq!(percent_of(1, 4), 25);
        assert_eq!(percent_of(3, 3), 100);
        assert_eq!(percent_of(1, 3), 33);
        assert_eq!(percent_of(0, 0), 100);
        assert_eq!(percent_of(5, 3), 100);
    }

    #[test]
    fn test_outcome_status_message() {
        assert_eq!(
            BatchOutcome::Completed { count: 2 }.status_message(),
            "Completed: 2 files"
        );
        assert_eq!(BatchOutcome::cancelled_by_user().status_message(), "Cancelled");
        assert_eq!(
            BatchOutcome::aborted_on_error("File exists").status_message(),
            "Error: File exists"
        );
    }

    #[test]
    fn test_mode_from_copy_flag() {
        assert_eq!(BatchMode::from_copy_flag(true), BatchMode::Copy);
        assert_eq!(BatchMode::from_copy_flag(false), BatchMode::Move);
    }
}
