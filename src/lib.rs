//! # millrun
//!
//! A multi-pass, cache-aware, parallel file-processing workflow engine.
//!
//! Batch operations over large file sets are expressed as an ordered list
//! of passes. Each pass may filter the file set, consult a persistent
//! fingerprint cache keyed by `(file, operation, params)`, process only the
//! files whose fingerprint changed, and fan work out across a bounded
//! worker pool. Per-file failures are collected as data; the workflow
//! always runs to completion and reports aggregate counts and the cache
//! hit rate.
//!
//! ## Usage
//!
//! ```no_run
//! use millrun::cache::FingerprintCache;
//! use millrun::config::EngineConfig;
//! use millrun::workflow::{FnProcessor, PassConfig, ResultEnvelope, WorkflowProcessor};
//! use std::path::{Path, PathBuf};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let cache = FingerprintCache::new(".millrun/cache")?;
//! let workflow = WorkflowProcessor::new(cache, EngineConfig::default());
//!
//! let passes = vec![PassConfig::new(
//!     "measure",
//!     "file-size",
//!     Arc::new(FnProcessor::new(|path: &Path| {
//!         Ok(Some(ResultEnvelope::new(std::fs::metadata(path)?.len())))
//!     })),
//! )
//! .with_cache(true)
//! .with_parallel(true)];
//!
//! let files = vec![PathBuf::from("a.txt"), PathBuf::from("b.txt")];
//! let result = workflow.run(files, &passes).await;
//! println!("cache hit rate: {:.1}%", result.summary.cache_hit_rate);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - `cache` - Persistent fingerprint cache for per-file operation results
//! - `config` - Engine configuration with TOML loading
//! - `display` - Best-effort human-readable status output
//! - `error` - Unified error type for engine operations
//! - `executor` - Sequential and worker-pool execution of a pass
//! - `filter` - Predicate-based partitioning of file sets
//! - `pool` - Worker pool sizing from task profiles and host resources
//! - `progress` - Progress reporting with a substitutable no-op
//! - `workflow` - Pass configuration, results, and the workflow processor

pub mod cache;
pub mod config;
pub mod display;
pub mod error;
pub mod executor;
pub mod filter;
pub mod pool;
pub mod progress;
pub mod workflow;

pub use error::{MillrunError, MillrunResult};
pub use workflow::{PassConfig, ResultEnvelope, WorkflowProcessor, WorkflowResult};
