// UI module - terminal front end for running a batch
//
// This module contains:
// - BatchController: drives a batch and feeds its events into state and the terminal
// - ErrorResolver: Continue/Abort decisions for failed files (policy or native dialog)
// - BatchProgress: indicatif progress bar

pub mod controller;
pub mod progress;
pub mod resolver;

pub use controller::BatchController;
pub use progress::BatchProgress;
pub use resolver::{DialogResolver, ErrorResolver, PolicyResolver, resolver_for};
