//! Engine configuration
//!
//! Knobs for the cache location and the worker pool sizing policy. All
//! fields have working defaults so `EngineConfig::default()` is a valid
//! configuration; a TOML loader is provided for callers that persist
//! settings alongside their own.

use crate::error::{MillrunError, MillrunResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default memory budget per worker when a pass does not declare one (MB)
pub const DEFAULT_MEMORY_PER_WORKER_MB: u64 = 512;

/// Configuration for the workflow engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Root directory for fingerprint cache storage
    pub cache_root: PathBuf,
    /// Upper bound on aggregate worker memory (MB)
    pub memory_ceiling_mb: u64,
    /// Multiplier over logical cores for I/O-bound worker pools
    pub io_multiplier: usize,
    /// Treat every file as needing processing, ignoring cache hits
    pub force_reprocess: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_root: PathBuf::from(".millrun/cache"),
            memory_ceiling_mb: 8192,
            io_multiplier: 4,
            force_reprocess: false,
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from a TOML document
    ///
    /// Missing fields fall back to their defaults.
    pub fn from_toml_str(content: &str) -> MillrunResult<Self> {
        toml::from_str(content)
            .map_err(|e| MillrunError::config("invalid engine configuration").with_source(e))
    }
}
