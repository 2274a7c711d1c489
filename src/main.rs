//! imgrename - Batch rename or copy photos and videos by pattern substitution
//!
//! Main entry point for the command line application.
//!
//! # Overview
//!
//! Every media file directly inside a directory (jpg, gif, mov, png, jpeg,
//! heic, mp4, bmp) whose name contains the search pattern is renamed, or
//! copied with `--copy`, replacing the first occurrence of the pattern.
//!
//! # Execution Flow
//!
//! 1. Parse arguments and load settings from `<config>/imgrename/imgrename.yaml`
//! 2. Initialize logging → `<config>/imgrename/logs/imgrename.log.<date>`
//! 3. Create tokio runtime
//! 4. Pick the directory (argument, or a native folder picker)
//! 5. Run the batch through [`BatchController`], Ctrl-C cancels between files
//! 6. Exit 0 when the batch completed, 1 otherwise

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, ValueEnum};
use imgrename::config::default_config_dir;
use imgrename::logging::LOG_PREFIX;
use imgrename::models::SubstitutionScope;
use imgrename::ui::{BatchController, resolver_for};
use imgrename::{
    APP_NAME, BatchMode, BatchRequest, ConfigManager, ErrorPolicy, StateManager, VERSION,
};
use std::process::ExitCode;
use std::sync::Arc;

/// What to do when a file cannot be renamed or copied
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OnError {
    /// Ask with a dialog for every failing file
    Ask,
    /// Skip the file and go on
    Continue,
    /// Stop the batch
    Abort,
}

impl From<OnError> for ErrorPolicy {
    fn from(value: OnError) -> Self {
        match value {
            OnError::Ask => ErrorPolicy::Ask,
            OnError::Continue => ErrorPolicy::Continue,
            OnError::Abort => ErrorPolicy::Abort,
        }
    }
}

/// Batch rename or copy photos and videos by replacing part of their names
#[derive(Parser, Debug)]
#[command(name = "imgrename")]
#[command(version)]
#[command(about, long_about = None)]
struct Args {
    /// Directory holding the files; opens a folder picker when omitted
    directory: Option<Utf8PathBuf>,

    /// Text to look for in each file name [default: from settings, "IMG"]
    #[arg(short, long)]
    search: Option<String>,

    /// Replacement text [default: the directory's name]
    #[arg(short, long)]
    replace: Option<String>,

    /// Copy files under their new names instead of renaming them
    #[arg(short, long)]
    copy: bool,

    /// Rename files even when the settings say to copy
    #[arg(long = "move", conflicts_with = "copy")]
    move_files: bool,

    /// Behaviour when a file fails [default: from settings, "ask"]
    #[arg(long, value_enum)]
    on_error: Option<OnError>,

    /// Substitute within the whole path rather than just the file name
    #[arg(long)]
    full_path: bool,

    /// Debug logging, also echoed to the console
    #[arg(long)]
    debug: bool,

    /// Settings directory
    #[arg(long)]
    config_dir: Option<Utf8PathBuf>,
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let config_dir = args.config_dir.clone().unwrap_or_else(default_config_dir);
    let config_manager = Arc::new(ConfigManager::new(&config_dir)?);
    let user_config = config_manager.load_user_config_or_default();

    let debug = args.debug || user_config.debug_mode;
    let _log_guard = imgrename::logging::setup_logging_with_console(
        &config_dir.join("logs"),
        LOG_PREFIX,
        debug,
        debug,
    )?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(2)
        .thread_name("imgrename-worker")
        .build()
        .context("Failed to create tokio runtime")?;

    let state_manager = Arc::new(StateManager::new());
    state_manager.load_from_user_config(&user_config);

    let directory = match args.directory.clone() {
        Some(directory) => Some(directory),
        None => pick_directory(user_config.last_directory.as_deref()),
    };
    // An empty path is reported as "No directory selected" by validation
    let directory = directory.unwrap_or_default();

    let search = args.search.unwrap_or(user_config.default_search);
    let replace = args
        .replace
        .unwrap_or_else(|| directory.file_name().unwrap_or_default().to_string());
    let mode = batch_mode(args.copy, args.move_files, user_config.copy_by_default);
    let scope = if args.full_path {
        SubstitutionScope::FullPath
    } else {
        user_config.substitution_scope
    };
    let policy = args.on_error.map(ErrorPolicy::from).unwrap_or(user_config.on_error);

    let request = BatchRequest::new(directory, search, replace, mode).with_scope(scope);

    let controller = Arc::new(
        BatchController::new(Arc::clone(&state_manager), resolver_for(policy))
            .with_config(Arc::clone(&config_manager))
            .with_progress_bar(true),
    );

    let result = runtime.block_on(async {
        let ctrl_c_controller = Arc::clone(&controller);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Ctrl-C received, stopping after the current file");
                ctrl_c_controller.cancel();
            }
        });

        controller.run_batch(request).await
    });

    runtime.shutdown_timeout(std::time::Duration::from_secs(5));

    let exit_code = match result {
        Ok(outcome) => {
            println!("{}", outcome.status_message());
            if outcome.is_completed() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    };

    tracing::info!("Application shutdown complete");
    Ok(exit_code)
}

/// `--copy` and `--move` win over the `copy_by_default` setting.
fn batch_mode(copy: bool, move_files: bool, copy_by_default: bool) -> BatchMode {
    if copy {
        BatchMode::Copy
    } else if move_files {
        BatchMode::Move
    } else {
        BatchMode::from_copy_flag(copy_by_default)
    }
}

/// Native folder picker opened at `start`, if given.
fn pick_directory(start: Option<&Utf8Path>) -> Option<Utf8PathBuf> {
    let mut dialog = rfd::FileDialog::new().set_title("Select a directory");
    if let Some(start) = start.filter(|dir| dir.is_dir()) {
        dialog = dialog.set_directory(start);
    }

    dialog.pick_folder().and_then(|path| {
        Utf8PathBuf::try_from(path)
            .map_err(|e| {
                tracing::error!("Failed to convert path to UTF-8: {}", e);
                e
            })
            .ok()
    })
}
