//! Progress reporting for ingestion runs
//!
//! Wraps an `indicatif` bar that tracks the completion percentage carried by
//! [`ProgressState`] snapshots. The bar length is fixed at 100 so row-based
//! (spreadsheet) and byte-based (delimited) estimates render the same way.

use crate::app::models::ProgressState;
use crate::app::services::ingestion::IngestionSummary;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

const BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {percent:>3}% {prefix} | {msg}";

/// Progress reporter for one source
pub struct ProgressReporter {
    progress_bar: Option<ProgressBar>,
}

impl ProgressReporter {
    /// Create a disabled reporter
    pub fn new() -> Self {
        Self { progress_bar: None }
    }

    /// Set up progress reporting for a source
    pub fn setup(&mut self, source_name: &str) {
        let pb = ProgressBar::new(100);
        let style = ProgressStyle::default_bar()
            .template(BAR_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ");
        pb.set_style(style);
        pb.set_prefix(source_name.to_string());
        pb.set_message("Starting");

        debug!("Progress bar initialized for {}", source_name);
        self.progress_bar = Some(pb);
    }

    /// Reflect a progress snapshot
    pub fn update(&self, progress: &ProgressState) {
        if let Some(ref pb) = self.progress_bar {
            pb.set_position(progress.percentage.round() as u64);
            let rows = match progress.total_count {
                Some(total) => format!("{}/{} rows", progress.processed_count, total),
                None => format!("{} rows", progress.processed_count),
            };
            pb.set_message(format!(
                "{} ({} valid, {} rejected)",
                rows, progress.valid_count, progress.rejected_count
            ));
        }
    }

    /// Finish with the run summary
    pub fn finish(&self, summary: &IngestionSummary) {
        if let Some(ref pb) = self.progress_bar {
            pb.set_position(100);
            let message = format!(
                "Completed: {} rows, {} valid, {} rejected",
                summary.total_rows, summary.valid_rows, summary.rejected_rows
            );
            pb.finish_with_message(message.clone());
            debug!("Progress reporting completed: {}", message);
        }
    }

    /// Finish after cancellation, leaving the bar where it stopped
    pub fn finish_cancelled(&self, summary: &IngestionSummary) {
        if let Some(ref pb) = self.progress_bar {
            pb.abandon_with_message(format!(
                "Cancelled after {} rows",
                summary.total_rows
            ));
        }
    }

    /// Finish progress reporting with an error message
    pub fn finish_with_error(&self, error_message: &str) {
        if let Some(ref pb) = self.progress_bar {
            pb.abandon_with_message(format!("Failed: {}", error_message));
            debug!("Progress reporting finished with error: {}", error_message);
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        if let Some(ref pb) = self.progress_bar {
            if !pb.is_finished() {
                pb.finish_and_clear();
            }
        }
    }
}
