//! Data models for Image Rename.
//!
//! - [`BatchRequest`], [`FileEntry`], [`RenamePlan`], [`ProgressEvent`] and
//!   [`BatchOutcome`]: the values that flow between the coordinator and the
//!   rename/copy engine
//! - [`UserConfig`]: preferences persisted to `imgrename.yaml`
//! - [`AppState`]: coordinator-side state, wrapped by
//!   [`StateManager`](crate::state::StateManager)
//! - [`MAX_CONCURRENT_BATCHES`]: always 1, only one batch may touch a directory at a time

pub mod app_state;
pub mod batch;
pub mod config;

pub use app_state::{AppState, FileStatus, INITIAL_STATUS, MAX_CONCURRENT_BATCHES};
pub use batch::{
    BatchMode, BatchOutcome, BatchRequest, CANCELLED_REASON, FileDecision, FileEntry,
    ProgressEvent, RenamePlan, SubstitutionScope, ValidationError, percent_of,
};
pub use config::{ErrorPolicy, UserConfig};
