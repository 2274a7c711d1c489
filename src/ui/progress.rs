//! Terminal progress bar for a running batch.

use crate::models::{BatchOutcome, ProgressEvent};
use indicatif::{ProgressBar, ProgressStyle};

/// Percentage bar with the current status line as its message.
pub struct BatchProgress {
    bar: ProgressBar,
}

impl BatchProgress {
    /// A visible bar on stderr.
    pub fn new(verb: &str, total_files: usize) -> Self {
        let bar = ProgressBar::new(100);
        let style = ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}% {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
        bar.set_style(style);
        bar.set_message(format!("{} {} files", verb, total_files));
        Self { bar }
    }

    /// A bar that draws nothing.
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    pub fn set_status(&self, message: &str) {
        self.bar.set_message(message.to_string());
    }

    pub fn update(&self, event: &ProgressEvent) {
        self.bar.set_position(u64::from(event.percent_complete));
        self.bar.set_message(event.status_line());
    }

    /// Print a line above the bar.
    pub fn println(&self, line: impl AsRef<str>) {
        self.bar.println(line);
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    pub fn finish(&self, outcome: &BatchOutcome) {
        if outcome.is_completed() {
            self.bar.set_position(100);
            self.bar.finish_with_message(outcome.status_message());
        } else {
            self.bar.abandon_with_message(outcome.status_message());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;

    #[test]
    fn test_update_tracks_percent() {
        let progress = BatchProgress::hidden();
        progress.update(&ProgressEvent {
            plan_index: 0,
            total: 4,
            original: Utf8PathBuf::from("/p/IMG_1.jpg"),
            destination: Utf8PathBuf::from("/p/PHOTO_1.jpg"),
            percent_complete: 25,
        });

        assert_eq!(progress.position(), 25);
    }

    #[test]
    fn test_finish_completed_fills_bar() {
        let progress = BatchProgress::hidden();
        progress.finish(&BatchOutcome::Completed { count: 0 });

        assert_eq!(progress.position(), 100);
    }
}
