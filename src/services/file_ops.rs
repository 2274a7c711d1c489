use crate::models::{BatchMode, RenamePlan};
use camino::{Utf8Path, Utf8PathBuf};
use std::io;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// What the filesystem operation actually did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOpStatus {
    Moved,
    Copied,
    /// Source and destination are the same path
    Unchanged,
}

/// Per-file failures. Recoverable: the batch asks whether to go on.
#[derive(Error, Debug)]
pub enum FileOperationError {
    #[error("{0} already exists")]
    DestinationExists(Utf8PathBuf),

    #[error("Failed to {action} {from} to {to}: {source}")]
    Io {
        action: &'static str,
        from: Utf8PathBuf,
        to: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FileOperationError {
    fn io(action: &'static str, from: &Utf8Path, to: &Utf8Path, source: io::Error) -> Self {
        Self::Io {
            action,
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source,
        }
    }
}

/// Run the move or copy described by `plan`.
///
/// Neither mode overwrites an existing destination. A plan whose destination
/// equals its source performs no filesystem call at all.
pub async fn execute(plan: &RenamePlan, mode: BatchMode) -> Result<FileOpStatus, FileOperationError> {
    let from = plan.original.path();
    let to = plan.destination.as_path();

    if plan.is_unchanged() {
        tracing::debug!("Search pattern not in {}, leaving it as is", from);
        return Ok(FileOpStatus::Unchanged);
    }

    match mode {
        BatchMode::Copy => {
            let bytes = copy_file(from, to).await?;
            tracing::debug!("Copied {} => {} ({} bytes)", from, to, bytes);
            Ok(FileOpStatus::Copied)
        }
        BatchMode::Move => {
            move_file(from, to).await?;
            tracing::debug!("Moved {} => {}", from, to);
            Ok(FileOpStatus::Moved)
        }
    }
}

/// Rename `from` to `to`, falling back to copy-then-delete across devices.
pub async fn move_file(from: &Utf8Path, to: &Utf8Path) -> Result<(), FileOperationError> {
    // rename(2) silently replaces an existing target on Unix. On a
    // case-insensitive filesystem a case-only rename finds the source itself.
    if fs::symlink_metadata(to).await.is_ok() && !is_same_file(from, to).await {
        return Err(FileOperationError::DestinationExists(to.to_path_buf()));
    }

    match fs::rename(from, to).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            tracing::info!("{} and {} are on different devices, copying instead", from, to);
            copy_file(from, to).await?;
            fs::remove_file(from)
                .await
                .map_err(|e| FileOperationError::io("remove original after copying", from, to, e))
        }
        Err(e) => Err(FileOperationError::io("move", from, to, e)),
    }
}

/// True when both paths name the same directory entry's file.
#[cfg(unix)]
async fn is_same_file(a: &Utf8Path, b: &Utf8Path) -> bool {
    use std::os::unix::fs::MetadataExt;

    match (fs::symlink_metadata(a).await, fs::symlink_metadata(b).await) {
        (Ok(a), Ok(b)) => a.dev() == b.dev() && a.ino() == b.ino(),
        _ => false,
    }
}

#[cfg(not(unix))]
async fn is_same_file(a: &Utf8Path, b: &Utf8Path) -> bool {
    match (fs::canonicalize(a).await, fs::canonicalize(b).await) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Copy `from` to a new file at `to`. Fails if `to` already exists.
pub async fn copy_file(from: &Utf8Path, to: &Utf8Path) -> Result<u64, FileOperationError> {
    let mut source = fs::File::open(from)
        .await
        .map_err(|e| FileOperationError::io("open", from, to, e))?;

    let mut target = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(to)
        .await
        .map_err(|e| match e.kind() {
            io::ErrorKind::AlreadyExists => FileOperationError::DestinationExists(to.to_path_buf()),
            _ => FileOperationError::io("copy", from, to, e),
        })?;

    let copied = async {
        let bytes = tokio::io::copy(&mut source, &mut target).await?;
        target.flush().await?;
        let permissions = source.metadata().await?.permissions();
        fs::set_permissions(to, permissions).await?;
        Ok::<u64, io::Error>(bytes)
    }
    .await;

    match copied {
        Ok(bytes) => Ok(bytes),
        Err(e) => {
            drop(target);
            if let Err(cleanup) = fs::remove_file(to).await {
                tracing::warn!("Failed to remove partial copy {}: {}", to, cleanup);
            }
            Err(FileOperationError::io("copy", from, to, e))
        }
    }
}
