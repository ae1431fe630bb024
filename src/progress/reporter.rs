//! Progress reporter implementation
//!
//! Uses indicatif for one byte bar per transfer, and keeps running totals
//! of transferred, skipped and failed items for the end-of-run summary.

use crate::report::Outcome;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Progress reporter for transfer operations
pub struct ProgressReporter {
    /// Start time
    start_time: Instant,
    /// Bytes moved so far
    bytes_transferred: AtomicU64,
    /// Items uploaded or downloaded
    files_transferred: AtomicU64,
    /// Items skipped as unchanged
    files_skipped: AtomicU64,
    /// Items that failed
    files_failed: AtomicU64,
    /// Is progress drawing enabled
    enabled: AtomicBool,
}

impl ProgressReporter {
    /// Create a new progress reporter
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            bytes_transferred: AtomicU64::new(0),
            files_transferred: AtomicU64::new(0),
            files_skipped: AtomicU64::new(0),
            files_failed: AtomicU64::new(0),
            enabled: AtomicBool::new(true),
        }
    }

    /// Create a reporter that draws nothing (quiet mode, tests)
    pub fn disabled() -> Self {
        let reporter = Self::new();
        reporter.enabled.store(false, Ordering::SeqCst);
        reporter
    }

    /// Check if drawing is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Start a byte bar for one transfer
    pub fn start_transfer(&self, label: &str) -> TransferBar {
        let bar = if self.is_enabled() {
            let bar = ProgressBar::new(0);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("{prefix:.bold.dim} [{bar:40.green/white}] {bytes}/{total_bytes} ({bytes_per_sec}, ETA {eta})")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("=> "),
            );
            bar.set_prefix(truncate_label(label));
            bar
        } else {
            ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::hidden())
        };

        TransferBar { bar }
    }

    /// Count a finished item by its outcome
    pub fn record(&self, outcome: Outcome, bytes: u64) {
        match outcome {
            Outcome::Uploaded | Outcome::Downloaded => {
                self.files_transferred.fetch_add(1, Ordering::Relaxed);
                self.bytes_transferred.fetch_add(bytes, Ordering::Relaxed);
            }
            Outcome::Skipped => {
                self.files_skipped.fetch_add(1, Ordering::Relaxed);
            }
            Outcome::Failed => {
                self.files_failed.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }
    }

    /// Get elapsed time
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Get progress summary
    pub fn summary(&self) -> ProgressSummary {
        ProgressSummary {
            bytes_transferred: self.bytes_transferred.load(Ordering::Relaxed),
            files_transferred: self.files_transferred.load(Ordering::Relaxed),
            files_skipped: self.files_skipped.load(Ordering::Relaxed),
            files_failed: self.files_failed.load(Ordering::Relaxed),
            elapsed: self.elapsed(),
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Byte progress of a single transfer
pub struct TransferBar {
    bar: ProgressBar,
}

impl TransferBar {
    /// Update from a backend progress callback
    pub fn update(&self, done: u64, total: u64) {
        if self.bar.length() != Some(total) {
            self.bar.set_length(total);
        }
        self.bar.set_position(done);
    }

    /// Bytes reported so far
    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    /// Finish and clear the bar
    pub fn finish(self) {
        self.bar.finish_and_clear();
    }

    /// Abandon the bar after a failure
    pub fn abandon(self) {
        self.bar.abandon();
    }
}

/// Run totals
#[derive(Debug, Clone)]
pub struct ProgressSummary {
    /// Bytes moved
    pub bytes_transferred: u64,
    /// Items uploaded or downloaded
    pub files_transferred: u64,
    /// Items skipped as unchanged
    pub files_skipped: u64,
    /// Items that failed
    pub files_failed: u64,
    /// Elapsed time
    pub elapsed: Duration,
}

impl ProgressSummary {
    /// Throughput in bytes/second
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.bytes_transferred as f64 / secs
        } else {
            0.0
        }
    }

    /// One-line summary
    pub fn describe(&self) -> String {
        format!(
            "{} transferred, {} skipped, {} failed, {} in {:.1?} ({}/s)",
            self.files_transferred,
            self.files_skipped,
            self.files_failed,
            humansize::format_size(self.bytes_transferred, humansize::BINARY),
            self.elapsed,
            humansize::format_size(self.throughput() as u64, humansize::BINARY)
        )
    }
}

fn truncate_label(label: &str) -> String {
    let count = label.chars().count();
    if count > 40 {
        let tail: String = label.chars().skip(count - 37).collect();
        format!("...{}", tail)
    } else {
        label.to_string()
    }
}
