//! Result types produced by passes and whole workflow runs

use crate::filter::FilterOutcome;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One successfully produced per-file result
#[derive(Debug, Clone, PartialEq)]
pub struct FileOutcome<T> {
    pub path: PathBuf,
    /// True when the result came out of the fingerprint cache
    pub cached: bool,
    pub data: T,
    pub exclude_from_next_pass: bool,
}

/// One per-file failure, recorded as data rather than aborting the pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileError {
    pub path: PathBuf,
    pub message: String,
}

impl FileError {
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Everything one pass produced, frozen once the pass returns
///
/// Accounting invariant: `results.len() + errors.len()` equals the number
/// of input files after filtering, and no file appears in both `results`
/// and `errors`.
#[derive(Debug, Clone)]
pub struct PassResult<T> {
    /// Display label of the pass
    pub name: String,
    /// Files the executor saw, after any filter step
    pub input_files: Vec<PathBuf>,
    /// Cache misses that were actually run
    pub processed_files: Vec<PathBuf>,
    /// Cache hits
    pub cached_files: Vec<PathBuf>,
    pub results: Vec<FileOutcome<T>>,
    pub errors: Vec<FileError>,
    /// The filter step's full three-way partition, when a predicate ran
    pub filtered: Option<FilterOutcome>,
}

/// Aggregate counts over a whole run
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSummary {
    pub total_processed: usize,
    pub total_cached: usize,
    pub total_results: usize,
    pub total_errors: usize,
    /// Percentage of cache hits over all cache-relevant work, 0.0 when
    /// nothing was processed or cached
    pub cache_hit_rate: f64,
}

impl WorkflowSummary {
    /// Sum per-pass counts and derive the overall cache hit rate
    pub fn from_passes<T>(passes: &[PassResult<T>]) -> Self {
        let total_processed = passes.iter().map(|p| p.processed_files.len()).sum();
        let total_cached = passes.iter().map(|p| p.cached_files.len()).sum();
        let total_results = passes.iter().map(|p| p.results.len()).sum();
        let total_errors = passes.iter().map(|p| p.errors.len()).sum();

        let denominator = total_cached + total_processed;
        let cache_hit_rate = if denominator == 0 {
            0.0
        } else {
            100.0 * total_cached as f64 / denominator as f64
        };

        Self {
            total_processed,
            total_cached,
            total_results,
            total_errors,
            cache_hit_rate,
        }
    }
}

/// The product of one end-to-end workflow run
///
/// Always returned in full: per-file failures live in
/// `pass_results[*].errors`, never in a top-level error.
#[derive(Debug, Clone)]
pub struct WorkflowResult<T> {
    /// The file set the run started from
    pub initial_files: Vec<PathBuf>,
    /// What remains after all `filter_remaining` exclusions
    pub final_files: Vec<PathBuf>,
    /// One entry per configured pass, in execution order
    pub pass_results: Vec<PassResult<T>>,
    pub summary: WorkflowSummary,
}
