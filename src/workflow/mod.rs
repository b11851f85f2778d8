//! Workflow processor: drives an ordered list of passes over a file set
//!
//! Each pass may filter the input, consult the fingerprint cache, and run
//! its operation sequentially or across a worker pool. Per-file failures
//! are data in the pass result, never control flow: the workflow always
//! runs every pass to completion and returns a full [`WorkflowResult`].
//! The only thing that stops a run early is a panic in caller-supplied
//! code, which the engine deliberately does not catch.

pub mod pass;
pub mod result;

pub use pass::{
    FileProcessor, FilterPredicate, FnProcessor, PassConfig, ResultEnvelope, ResultParser,
};
pub use result::{FileError, FileOutcome, PassResult, WorkflowResult, WorkflowSummary};

use crate::cache::{Classification, FingerprintCache};
use crate::config::EngineConfig;
use crate::display::{StatusDisplay, TracingDisplay};
use crate::executor;
use crate::filter::filter_paths;
use crate::pool::HostResources;
use crate::progress::{NoopProgress, ProgressReporter};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Orchestrates multi-pass runs against one fingerprint cache
pub struct WorkflowProcessor {
    cache: FingerprintCache,
    config: EngineConfig,
    host: HostResources,
    display: Arc<dyn StatusDisplay>,
    progress: Arc<dyn ProgressReporter>,
}

impl WorkflowProcessor {
    /// Create a processor with the default display and no progress output
    pub fn new(cache: FingerprintCache, config: EngineConfig) -> Self {
        Self {
            cache,
            config,
            host: HostResources::detect(),
            display: Arc::new(TracingDisplay),
            progress: Arc::new(NoopProgress),
        }
    }

    pub fn with_display(mut self, display: Arc<dyn StatusDisplay>) -> Self {
        self.display = display;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    /// Override detected host resources, mainly for tests
    pub fn with_host_resources(mut self, host: HostResources) -> Self {
        self.host = host;
        self
    }

    /// Treat every file as needing processing on this processor's runs
    pub fn with_force_reprocess(mut self, force: bool) -> Self {
        self.config.force_reprocess = force;
        self
    }

    /// Run every pass in order over a shrinking file set
    pub async fn run<T>(
        &self,
        files: Vec<PathBuf>,
        passes: &[PassConfig<T>],
    ) -> WorkflowResult<T>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
    {
        let initial_files = files.clone();
        let mut current = files;
        let mut pass_results = Vec::with_capacity(passes.len());

        for pass in passes {
            self.display.section(&pass.name);
            let pass_result = self.run_pass(&current, pass).await;

            if pass.filter_remaining {
                let excluded: HashSet<PathBuf> = pass_result
                    .results
                    .iter()
                    .filter(|r| r.exclude_from_next_pass)
                    .map(|r| r.path.clone())
                    .collect();
                if !excluded.is_empty() {
                    debug!(
                        excluded = excluded.len(),
                        pass = %pass.name,
                        "dropping files from subsequent passes"
                    );
                    current.retain(|p| !excluded.contains(p));
                }
            }

            pass_results.push(pass_result);
        }

        let summary = WorkflowSummary::from_passes(&pass_results);
        info!(
            passes = pass_results.len(),
            processed = summary.total_processed,
            cached = summary.total_cached,
            errors = summary.total_errors,
            cache_hit_rate = summary.cache_hit_rate,
            "workflow complete"
        );

        WorkflowResult {
            initial_files,
            final_files: current,
            pass_results,
            summary,
        }
    }

    async fn run_pass<T>(&self, files: &[PathBuf], pass: &PassConfig<T>) -> PassResult<T>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
    {
        // Best-effort pre-run preview; purely informational.
        if pass.enable_cache {
            let summary = self.cache.summarize(
                files,
                &pass.operation_name,
                &pass.operation_params,
                self.config.force_reprocess,
            );
            self.display
                .info(&format!("{}: {summary}", pass.name));
        }

        let (working, filtered) = match &pass.filter_predicate {
            Some(predicate) => {
                let outcome = filter_paths(files, predicate.as_ref());
                self.display.progress(&format!(
                    "{}: {} accepted, {} rejected, {} filter errors",
                    pass.name,
                    outcome.accepted.len(),
                    outcome.rejected.len(),
                    outcome.errors.len()
                ));
                (outcome.accepted.clone(), Some(outcome))
            }
            None => (files.to_vec(), None),
        };

        let classification = if pass.enable_cache {
            self.cache.classify(
                &working,
                &pass.operation_name,
                &pass.operation_params,
                self.config.force_reprocess,
            )
        } else {
            Classification {
                cached: Vec::new(),
                needs_processing: working.clone(),
            }
        };

        let mut results = Vec::with_capacity(working.len());
        let mut errors = Vec::new();

        // Cache hits first: loaded, never reprocessed.
        for path in &classification.cached {
            match self.load_cached(path, pass) {
                Ok(envelope) => results.push(FileOutcome {
                    path: path.clone(),
                    cached: true,
                    data: envelope.data,
                    exclude_from_next_pass: envelope.exclude_from_next_pass,
                }),
                Err(message) => {
                    self.display
                        .error(&format!("{}: {message}", path.display()));
                    errors.push(FileError::new(path.clone(), message));
                }
            }
        }

        self.progress.begin(
            &pass.name,
            classification.needs_processing.len() as u64,
        );
        let cache = pass.enable_cache.then_some(&self.cache);
        let executed = if pass.parallel {
            executor::run_parallel(
                &classification.needs_processing,
                pass,
                cache,
                self.host,
                self.config.memory_ceiling_mb,
                self.config.io_multiplier,
                self.progress.as_ref(),
            )
            .await
        } else {
            executor::run_sequential(
                &classification.needs_processing,
                pass,
                cache,
                self.progress.as_ref(),
            )
            .await
        };
        self.progress.finish("done");

        results.extend(executed.results);
        errors.extend(executed.errors);

        PassResult {
            name: pass.name.clone(),
            input_files: working,
            processed_files: classification.needs_processing,
            cached_files: classification.cached,
            results,
            errors,
            filtered,
        }
    }

    /// Load and decode a cache hit into the envelope `process` would return
    fn load_cached<T>(
        &self,
        path: &std::path::Path,
        pass: &PassConfig<T>,
    ) -> Result<ResultEnvelope<T>, String>
    where
        T: DeserializeOwned,
    {
        let value = self
            .cache
            .load(path, &pass.operation_name, &pass.operation_params)
            .map_err(|e| e.to_string())?
            .ok_or_else(|| "cache record disappeared after classification".to_string())?;

        match &pass.result_parser {
            Some(parser) => parser(value).map_err(|e| format!("cached result rejected: {e}")),
            None => serde_json::from_value(value)
                .map_err(|e| format!("failed to decode cached result: {e}")),
        }
    }
}
