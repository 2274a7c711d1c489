use crate::models::FileEntry;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::io;
use thiserror::Error;

/// Extensions the scanner picks up, compared case-insensitively.
pub const MEDIA_EXTENSIONS: &[&str] = &["jpg", "gif", "mov", "png", "jpeg", "heic", "mp4", "bmp"];

/// Errors that prevent a directory from being scanned at all
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Directory {0} does not exist")]
    NotFound(Utf8PathBuf),

    #[error("{0} is not a directory")]
    NotADirectory(Utf8PathBuf),

    #[error("Cannot read directory {path}: {source}")]
    Unreadable {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Check whether a path carries one of the [`MEDIA_EXTENSIONS`].
pub fn is_media_file(path: &Utf8Path) -> bool {
    path.extension()
        .map(|ext| {
            MEDIA_EXTENSIONS
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

/// List the media files directly inside `directory`.
///
/// Subdirectories are not descended into. Entries whose extension is not in
/// [`MEDIA_EXTENSIONS`], entries without an extension, and anything that is
/// not a regular file are left out. Order is whatever the platform's
/// directory enumeration yields; the result is a snapshot and is not
/// refreshed while a batch runs.
pub fn scan_directory(directory: &Utf8Path) -> Result<Vec<FileEntry>, ScanError> {
    tracing::debug!("Scanning directory: {}", directory);

    let metadata = fs::metadata(directory).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ScanError::NotFound(directory.to_path_buf()),
        _ => ScanError::Unreadable {
            path: directory.to_path_buf(),
            source: e,
        },
    })?;

    if !metadata.is_dir() {
        return Err(ScanError::NotADirectory(directory.to_path_buf()));
    }

    let unreadable = |source: io::Error| ScanError::Unreadable {
        path: directory.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    let mut ignored = 0usize;

    for entry in fs::read_dir(directory).map_err(unreadable)? {
        let entry = entry.map_err(unreadable)?;

        let path = match Utf8PathBuf::try_from(entry.path()) {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!("Skipping entry with non UTF-8 name: {}", e);
                ignored += 1;
                continue;
            }
        };

        if !is_media_file(&path) {
            ignored += 1;
            continue;
        }

        // Follows symlinks, so a link to a regular file still counts
        match fs::metadata(&path) {
            Ok(meta) if meta.is_file() => files.push(FileEntry::new(path)),
            Ok(_) => ignored += 1,
            Err(e) => {
                tracing::warn!("Skipping {}: {}", path, e);
                ignored += 1;
            }
        }
    }

    tracing::info!(
        "Scanned {}: {} media files, {} other entries ignored",
        directory,
        files.len(),
        ignored
    );

    Ok(files)
}
