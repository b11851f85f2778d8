//! Human-readable status display
//!
//! Best-effort status output for workflow runs. Implementations are
//! infallible by construction; nothing about engine correctness depends on
//! whether anything is rendered.

use tracing::{error, info};

/// Sink for human-readable workflow status
pub trait StatusDisplay: Send + Sync {
    /// Informational message
    fn info(&self, message: &str);

    /// Section header, e.g. the start of a pass
    fn section(&self, title: &str);

    /// Short progress note
    fn progress(&self, message: &str);

    /// Error message
    fn error(&self, message: &str);
}

/// Default display that routes everything through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDisplay;

impl StatusDisplay for TracingDisplay {
    fn info(&self, message: &str) {
        info!("{message}");
    }

    fn section(&self, title: &str) {
        info!("=== {title} ===");
    }

    fn progress(&self, message: &str) {
        info!("{message}");
    }

    fn error(&self, message: &str) {
        error!("{message}");
    }
}

/// Display that swallows everything, for tests and embedding
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDisplay;

impl StatusDisplay for NoopDisplay {
    fn info(&self, _message: &str) {}
    fn section(&self, _title: &str) {}
    fn progress(&self, _message: &str) {}
    fn error(&self, _message: &str) {}
}
