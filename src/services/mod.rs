//! Services module - the file-batch rename/copy logic.
//!
//! Nothing in here knows about the terminal, dialogs or persisted settings;
//! every input arrives as an explicit parameter.
//!
//! # Components
//!
//! - [`scanner`]: lists the media files directly inside a directory
//!   ([`MEDIA_EXTENSIONS`], case-insensitive). Fails with [`ScanError`] when
//!   the directory is missing or unreadable.
//! - [`substitution`]: literal first-occurrence replacement and destination
//!   planning, scoped to the file name or the full path.
//! - [`file_ops`]: the move/copy executor. Never overwrites; moves fall back
//!   to copy-then-delete across devices.
//! - [`engine`]: [`RenameEngine`] runs one batch on a tokio task, emitting
//!   ordered [`BatchEvent`]s, pausing on per-file failures until the
//!   coordinator answers, and honouring cancellation between files.
//!
//! # Usage Example
//!
//! ```ignore
//! use imgrename::models::{BatchMode, BatchRequest, FileDecision};
//! use imgrename::services::RenameEngine;
//!
//! let engine = RenameEngine::new();
//! let mut handle = engine.start(BatchRequest::new("/photos", "IMG", "PHOTO", BatchMode::Move))?;
//!
//! while let Some(event) = handle.next_event().await {
//!     match event {
//!         BatchEvent::Progress(p) => println!("{}% {}", p.percent_complete, p.status_line()),
//!         BatchEvent::FileError(prompt) => prompt.respond(FileDecision::Continue),
//!         _ => {}
//!     }
//! }
//! let outcome = handle.join().await;
//! ```

pub mod engine;
pub mod file_ops;
pub mod scanner;
pub mod substitution;

pub use engine::{
    BatchEvent, BatchHandle, CancelHandle, EngineError, FileErrorPrompt, RenameEngine,
    STARTED_STATUS,
};
pub use file_ops::{FileOpStatus, FileOperationError};
pub use scanner::{MEDIA_EXTENSIONS, ScanError, is_media_file, scan_directory};
pub use substitution::{plan_destination, replace_first};
