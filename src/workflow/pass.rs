//! Per-pass configuration and the processor seam
//!
//! A pass applies one operation to a file set. The unit of work is the
//! [`FileProcessor`] trait; callers with a plain closure can wrap it in
//! [`FnProcessor`]. Results travel in an explicit [`ResultEnvelope`] so the
//! engine can read the `exclude_from_next_pass` flag without reflection.

use crate::config::DEFAULT_MEMORY_PER_WORKER_MB;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Envelope around a per-file result
///
/// The envelope is what gets serialized into the fingerprint cache, so a
/// cached load restores the exclusion flag along with the payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultEnvelope<T> {
    /// The caller's result payload
    pub data: T,
    /// Drop this file from the input set of all subsequent passes
    pub exclude_from_next_pass: bool,
}

impl<T> ResultEnvelope<T> {
    /// Envelope that keeps the file in play for later passes
    pub fn new(data: T) -> Self {
        Self {
            data,
            exclude_from_next_pass: false,
        }
    }

    /// Envelope that flags the file for exclusion from later passes
    pub fn excluded(data: T) -> Self {
        Self {
            data,
            exclude_from_next_pass: true,
        }
    }
}

/// The per-file unit of work for a pass
///
/// `Ok(None)` signals an empty result, which the executor reports as a
/// per-file error distinct from `Err(_)`. Implementations must be safe to
/// invoke concurrently across distinct paths when the pass runs parallel.
#[async_trait]
pub trait FileProcessor<T>: Send + Sync {
    async fn process(&self, path: &Path) -> Result<Option<ResultEnvelope<T>>>;
}

/// Adapter so plain closures satisfy [`FileProcessor`]
pub struct FnProcessor<F> {
    f: F,
}

impl<F> FnProcessor<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<T, F> FileProcessor<T> for FnProcessor<F>
where
    T: Send + 'static,
    F: Fn(&Path) -> Result<Option<ResultEnvelope<T>>> + Send + Sync,
{
    async fn process(&self, path: &Path) -> Result<Option<ResultEnvelope<T>>> {
        (self.f)(path)
    }
}

/// Predicate deciding whether a pass should touch a path
pub type FilterPredicate = Arc<dyn Fn(&Path) -> Result<bool> + Send + Sync>;

/// Transform a raw cached value into the envelope `process` would return
///
/// Only needed when the cached representation differs from the envelope's
/// serde encoding; the default path deserializes the envelope directly.
pub type ResultParser<T> = Arc<dyn Fn(Value) -> Result<ResultEnvelope<T>> + Send + Sync>;

/// Immutable configuration for one workflow pass
pub struct PassConfig<T> {
    /// Display label
    pub name: String,
    /// Cache-key component distinguishing this operation's semantics
    pub operation_name: String,
    /// Order-independent operation parameters, part of the cache key
    pub operation_params: BTreeMap<String, String>,
    /// Consult and update the fingerprint cache
    pub enable_cache: bool,
    /// Optional pre-filter over the input set
    pub filter_predicate: Option<FilterPredicate>,
    /// The unit of work
    pub processor: Arc<dyn FileProcessor<T>>,
    /// Optional custom decoding of cached values
    pub result_parser: Option<ResultParser<T>>,
    /// Fan out across a bounded worker pool
    pub parallel: bool,
    /// Declared memory budget per parallel worker (MB)
    pub memory_per_worker_mb: u64,
    /// Apply `exclude_from_next_pass` flags to the running file set
    pub filter_remaining: bool,
}

impl<T> PassConfig<T> {
    pub fn new(
        name: impl Into<String>,
        operation_name: impl Into<String>,
        processor: Arc<dyn FileProcessor<T>>,
    ) -> Self {
        Self {
            name: name.into(),
            operation_name: operation_name.into(),
            operation_params: BTreeMap::new(),
            enable_cache: false,
            filter_predicate: None,
            processor,
            result_parser: None,
            parallel: false,
            memory_per_worker_mb: DEFAULT_MEMORY_PER_WORKER_MB,
            filter_remaining: false,
        }
    }

    pub fn with_params(mut self, params: BTreeMap<String, String>) -> Self {
        self.operation_params = params;
        self
    }

    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.enable_cache = enabled;
        self
    }

    pub fn with_filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Path) -> Result<bool> + Send + Sync + 'static,
    {
        self.filter_predicate = Some(Arc::new(predicate));
        self
    }

    pub fn with_result_parser<F>(mut self, parser: F) -> Self
    where
        F: Fn(Value) -> Result<ResultEnvelope<T>> + Send + Sync + 'static,
    {
        self.result_parser = Some(Arc::new(parser));
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_memory_per_worker(mut self, mb: u64) -> Self {
        self.memory_per_worker_mb = mb;
        self
    }

    pub fn with_filter_remaining(mut self, enabled: bool) -> Self {
        self.filter_remaining = enabled;
        self
    }
}
