//! Unified error type for the millrun engine
//!
//! Per-file processing failures are data, not errors: they are collected as
//! [`crate::workflow::FileError`] entries inside pass results. `MillrunError`
//! covers the engine's own fallible operations (cache storage, configuration
//! loading) that callers may want to match on.

use std::path::PathBuf;
use thiserror::Error;

/// The unified error type for the millrun engine
#[derive(Error, Debug)]
pub enum MillrunError {
    #[error("Cache error: {message}")]
    Cache {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Workflow error in pass '{pass}': {message}")]
    Workflow { pass: String, message: String },
}

impl MillrunError {
    /// Create a cache error without an associated path
    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache {
            message: message.into(),
            path: None,
            source: None,
        }
    }

    /// Create a cache error tied to a specific file
    pub fn cache_with_path(message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::Cache {
            message: message.into(),
            path: Some(path.into()),
            source: None,
        }
    }

    /// Attach an underlying cause to this error
    pub fn with_source(
        mut self,
        src: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        match &mut self {
            Self::Cache { source, .. } | Self::Config { source, .. } => {
                *source = Some(Box::new(src));
            }
            Self::Workflow { .. } => {}
        }
        self
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// Create a workflow error scoped to a named pass
    pub fn workflow(pass: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Workflow {
            pass: pass.into(),
            message: message.into(),
        }
    }
}

/// Convenience result alias for engine operations
pub type MillrunResult<T> = Result<T, MillrunError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_error_displays_message() {
        let err = MillrunError::cache("record unreadable");
        assert_eq!(err.to_string(), "Cache error: record unreadable");
    }

    #[test]
    fn with_source_preserves_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = MillrunError::cache_with_path("read failed", "/tmp/x").with_source(io);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn workflow_error_names_the_pass() {
        let err = MillrunError::workflow("analyze", "no processor configured");
        assert!(err.to_string().contains("analyze"));
    }
}
