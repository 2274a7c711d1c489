// imgrename - Batch rename or copy photos and videos by pattern substitution
//
// This is the library crate containing the core batch logic and data structures.
// The binary crate (main.rs) provides the command line entry point.

pub mod config;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod state;
pub mod ui;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use models::{
    AppState, BatchMode, BatchOutcome, BatchRequest, ErrorPolicy, FileDecision, UserConfig,
};
pub use services::{BatchEvent, EngineError, RenameEngine};
pub use state::{StateChange, StateManager};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
