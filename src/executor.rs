//! Pass executor: runs the per-file operation over a resolved file set
//!
//! Two execution paths share one per-file pipeline. The sequential path
//! preserves input order; the parallel path bounds in-flight work with a
//! semaphore sized by the worker pool sizer and makes no ordering
//! guarantee. A single file's failure never aborts the pass on either
//! path; failures become [`FileError`] entries.
//!
//! The executor only ever sees cache misses: classification happened
//! before it was invoked, so nothing here can both load and reprocess the
//! same file within a pass.

use crate::cache::FingerprintCache;
use crate::pool::{compute_worker_count, HostResources, TaskProfile, TaskType};
use crate::progress::ProgressReporter;
use crate::workflow::pass::PassConfig;
use crate::workflow::result::{FileError, FileOutcome};
use futures::future::join_all;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

/// What the executor produced for one file set
#[derive(Debug, Default)]
pub struct ExecutionOutcome<T> {
    pub results: Vec<FileOutcome<T>>,
    pub errors: Vec<FileError>,
}

impl<T> ExecutionOutcome<T> {
    fn empty() -> Self {
        Self {
            results: Vec::new(),
            errors: Vec::new(),
        }
    }
}

/// Raw per-file outcome before partitioning
enum WorkerOutcome<T> {
    Success(FileOutcome<T>),
    Failure(FileError),
}

/// Run files one at a time, in input order
pub async fn run_sequential<T>(
    files: &[PathBuf],
    pass: &PassConfig<T>,
    cache: Option<&FingerprintCache>,
    progress: &dyn ProgressReporter,
) -> ExecutionOutcome<T>
where
    T: Serialize + Send + 'static,
{
    let mut outcome = ExecutionOutcome::empty();

    for (index, path) in files.iter().enumerate() {
        match process_one(path, pass, cache, false).await {
            WorkerOutcome::Success(result) => outcome.results.push(result),
            WorkerOutcome::Failure(error) => outcome.errors.push(error),
        }
        progress.on_advance((index + 1) as u64);
    }

    outcome
}

/// Fan files out across a bounded worker pool
///
/// Worker count comes from the pool sizer with an I/O-intensive profile
/// and the pass's declared per-worker memory budget. Workers re-check that
/// their file still exists before processing, since enumeration may be
/// arbitrarily stale by the time a worker picks the file up.
pub async fn run_parallel<T>(
    files: &[PathBuf],
    pass: &PassConfig<T>,
    cache: Option<&FingerprintCache>,
    host: HostResources,
    memory_ceiling_mb: u64,
    io_multiplier: usize,
    progress: &dyn ProgressReporter,
) -> ExecutionOutcome<T>
where
    T: Serialize + Send + 'static,
{
    if files.is_empty() {
        return ExecutionOutcome::empty();
    }

    let profile = TaskProfile {
        task_type: TaskType::IoIntensive,
        memory_per_worker_mb: pass.memory_per_worker_mb,
    };
    let workers = compute_worker_count(profile, host, memory_ceiling_mb, io_multiplier);
    debug!(workers, files = files.len(), pass = %pass.name, "parallel execution");

    let semaphore = Semaphore::new(workers);
    let slots: Mutex<Vec<Option<WorkerOutcome<T>>>> =
        Mutex::new((0..files.len()).map(|_| None).collect());
    let completed = AtomicU64::new(0);

    let workers_fut = files.iter().enumerate().map(|(index, path)| {
        let semaphore = &semaphore;
        let slots = &slots;
        let completed = &completed;
        async move {
            let _permit = semaphore.acquire().await.unwrap();
            let outcome = process_one(path, pass, cache, true).await;
            slots.lock().unwrap()[index] = Some(outcome);
            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            progress.on_advance(done);
        }
    });
    join_all(workers_fut).await;

    let mut outcome = ExecutionOutcome::empty();
    for slot in slots.into_inner().unwrap() {
        match slot {
            Some(WorkerOutcome::Success(result)) => outcome.results.push(result),
            Some(WorkerOutcome::Failure(error)) => outcome.errors.push(error),
            // Should not occur: every worker fills its slot. Surface the
            // anomaly so pass counts stay reconcilable.
            None => outcome
                .errors
                .push(FileError::new("unknown", "missing worker outcome")),
        }
    }
    outcome
}

/// The shared per-file pipeline: validate, process, store, record
async fn process_one<T>(
    path: &Path,
    pass: &PassConfig<T>,
    cache: Option<&FingerprintCache>,
    validate_exists: bool,
) -> WorkerOutcome<T>
where
    T: Serialize + Send + 'static,
{
    if validate_exists && !path.exists() {
        return WorkerOutcome::Failure(FileError::new(path, "file no longer exists"));
    }

    match pass.processor.process(path).await {
        Ok(Some(envelope)) => {
            if let Some(cache) = cache {
                match serde_json::to_value(&envelope) {
                    Ok(value) => {
                        if let Err(e) = cache.store(
                            path,
                            &pass.operation_name,
                            &pass.operation_params,
                            value,
                        ) {
                            warn!(path = %path.display(), error = %e, "cache store failed");
                        }
                    }
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "result not serializable, skipping cache store");
                    }
                }
            }
            WorkerOutcome::Success(FileOutcome {
                path: path.to_path_buf(),
                cached: false,
                data: envelope.data,
                exclude_from_next_pass: envelope.exclude_from_next_pass,
            })
        }
        Ok(None) => WorkerOutcome::Failure(FileError::new(path, "process returned empty result")),
        Err(e) => WorkerOutcome::Failure(FileError::new(path, e.to_string())),
    }
}
