//! Progress reporting for a named unit of work
//!
//! The engine reports progress through the [`ProgressReporter`] trait so
//! display concerns stay out of the execution path. [`NoopProgress`] is the
//! default; [`BarProgress`] renders an indicatif bar.

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;

/// Receiver for incremental progress of a named unit of work
pub trait ProgressReporter: Send + Sync {
    /// Begin a new unit of work with a known total
    fn begin(&self, label: &str, total: u64);

    /// Report that `completed` items have finished so far
    fn on_advance(&self, completed: u64);

    /// Mark the current unit of work as finished
    fn finish(&self, message: &str);
}

/// Progress reporter that does nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn begin(&self, _label: &str, _total: u64) {}
    fn on_advance(&self, _completed: u64) {}
    fn finish(&self, _message: &str) {}
}

/// Terminal progress bar backed by indicatif
pub struct BarProgress {
    bar: Mutex<Option<ProgressBar>>,
}

impl BarProgress {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }
}

impl Default for BarProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for BarProgress {
    fn begin(&self, label: &str, total: u64) {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
                )
                .unwrap()
                .progress_chars("█▓▒░ "),
        );
        pb.set_message(label.to_string());
        *self.bar.lock().unwrap() = Some(pb);
    }

    fn on_advance(&self, completed: u64) {
        if let Some(pb) = self.bar.lock().unwrap().as_ref() {
            pb.set_position(completed);
        }
    }

    fn finish(&self, message: &str) {
        if let Some(pb) = self.bar.lock().unwrap().take() {
            pb.finish_with_message(message.to_string());
        }
    }
}
