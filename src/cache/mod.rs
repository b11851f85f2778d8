//! Fingerprint cache for per-file operation results
//!
//! Maps `(file, operation, params)` keys to the serialized result of the
//! last successful processing run, together with the file's content
//! fingerprint at that time. A record whose fingerprint still matches the
//! file on disk is a cache hit; anything else (no record, stale
//! fingerprint, unreadable record) needs processing.
//!
//! Storage is one JSON file per key under a per-operation subdirectory.
//! Writes go through a temp file followed by an atomic rename, and writes
//! to the same key are serialized through a keyed lock table so concurrent
//! workers cannot corrupt a record. Distinct keys never contend. The engine
//! never deletes records; [`FingerprintCache::clear`] exists as an
//! administrative operation.

pub mod fingerprint;

use crate::error::{MillrunError, MillrunResult};
use chrono::{DateTime, Utc};
use fingerprint::{digest_str, fingerprint_file};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// One persisted cache entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheRecord {
    /// Content fingerprint of the file when the result was computed
    pub fingerprint: String,
    /// Digest of the canonicalized operation parameters
    pub params_digest: String,
    /// The serialized result payload
    pub result: serde_json::Value,
    /// When the record was written
    pub recorded_at: DateTime<Utc>,
}

/// Outcome of splitting a file set into hits and misses
#[derive(Debug, Clone, Default)]
pub struct Classification {
    /// Files with a valid, non-stale record
    pub cached: Vec<PathBuf>,
    /// Files that must be (re)processed
    pub needs_processing: Vec<PathBuf>,
}

/// Read-only preview of how a file set would classify
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheSummary {
    pub cached: usize,
    pub to_process: usize,
}

impl fmt::Display for CacheSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} cached, {} to process", self.cached, self.to_process)
    }
}

/// Directory-backed fingerprint cache
pub struct FingerprintCache {
    root: PathBuf,
    key_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl FingerprintCache {
    /// Create a cache rooted at the given directory, creating it if needed
    pub fn new(root: impl Into<PathBuf>) -> MillrunResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| {
            MillrunError::cache_with_path("failed to create cache directory", &root)
                .with_source(e)
        })?;
        Ok(Self {
            root,
            key_locks: Mutex::new(HashMap::new()),
        })
    }

    /// Cheap read-only preview of hits vs misses for a file set
    ///
    /// Never mutates cache state; intended for pre-run status display.
    pub fn summarize(
        &self,
        paths: &[PathBuf],
        operation: &str,
        params: &BTreeMap<String, String>,
        force: bool,
    ) -> CacheSummary {
        let classification = self.classify(paths, operation, params, force);
        CacheSummary {
            cached: classification.cached.len(),
            to_process: classification.needs_processing.len(),
        }
    }

    /// Split a file set into cache hits and files needing processing
    ///
    /// A path is a hit iff a record exists, its fingerprint matches the
    /// file's current content, and `force` is false. Missing files,
    /// unreadable records, and fingerprint mismatches all classify as
    /// needing processing.
    pub fn classify(
        &self,
        paths: &[PathBuf],
        operation: &str,
        params: &BTreeMap<String, String>,
        force: bool,
    ) -> Classification {
        let mut classification = Classification::default();

        for path in paths {
            if force {
                classification.needs_processing.push(path.clone());
                continue;
            }
            let hit = match (self.read_record(path, operation, params), fingerprint_file(path)) {
                (Some(record), Ok(current)) => record.fingerprint == current,
                _ => false,
            };
            if hit {
                classification.cached.push(path.clone());
            } else {
                classification.needs_processing.push(path.clone());
            }
        }

        classification
    }

    /// Load the last stored result for a key, regardless of staleness
    ///
    /// Staleness is `classify`'s concern; `load` returns whatever was
    /// stored last. `Ok(None)` means no record exists. A record that
    /// exists but cannot be read or parsed is an error, which callers
    /// surface as a per-file error entry.
    pub fn load(
        &self,
        path: &Path,
        operation: &str,
        params: &BTreeMap<String, String>,
    ) -> MillrunResult<Option<serde_json::Value>> {
        let record_path = self.record_path(path, operation, params);
        if !record_path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&record_path).map_err(|e| {
            MillrunError::cache_with_path("failed to read cache record", path).with_source(e)
        })?;
        let record: CacheRecord = serde_json::from_str(&contents).map_err(|e| {
            MillrunError::cache_with_path("failed to deserialize cache record", path)
                .with_source(e)
        })?;

        Ok(Some(record.result))
    }

    /// Write or overwrite the record for a key
    ///
    /// Safe under concurrent calls: same-key writers are serialized by a
    /// keyed lock (last writer wins), and the write itself is a temp file
    /// plus atomic rename so readers never observe a partial record.
    pub fn store(
        &self,
        path: &Path,
        operation: &str,
        params: &BTreeMap<String, String>,
        result: serde_json::Value,
    ) -> MillrunResult<()> {
        let fingerprint = fingerprint_file(path)?;
        let record = CacheRecord {
            fingerprint,
            params_digest: digest_str(&canonical_params(params)),
            result,
            recorded_at: Utc::now(),
        };

        let record_path = self.record_path(path, operation, params);
        if let Some(parent) = record_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                MillrunError::cache_with_path("failed to create cache subdirectory", parent)
                    .with_source(e)
            })?;
        }

        let json = serde_json::to_string_pretty(&record).map_err(|e| {
            MillrunError::cache_with_path("failed to serialize cache record", path)
                .with_source(e)
        })?;

        let lock = self.key_lock(&record_path);
        let _guard = lock.lock().unwrap();

        let temp_path = record_path.with_extension("tmp");
        fs::write(&temp_path, json).map_err(|e| {
            MillrunError::cache_with_path("failed to write cache record", path).with_source(e)
        })?;
        fs::rename(&temp_path, &record_path).map_err(|e| {
            MillrunError::cache_with_path("failed to commit cache record", path).with_source(e)
        })?;

        debug!(path = %path.display(), operation, "cache record stored");
        Ok(())
    }

    /// Administrative wipe of all records under the cache root
    ///
    /// Never called by the engine itself.
    pub fn clear(&self) -> MillrunResult<()> {
        if self.root.exists() {
            fs::remove_dir_all(&self.root).map_err(|e| {
                MillrunError::cache_with_path("failed to clear cache", &self.root).with_source(e)
            })?;
        }
        fs::create_dir_all(&self.root).map_err(|e| {
            MillrunError::cache_with_path("failed to recreate cache directory", &self.root)
                .with_source(e)
        })?;
        Ok(())
    }

    /// Lenient record read used by `classify`: any failure is a miss
    fn read_record(
        &self,
        path: &Path,
        operation: &str,
        params: &BTreeMap<String, String>,
    ) -> Option<CacheRecord> {
        let record_path = self.record_path(path, operation, params);
        let contents = fs::read_to_string(record_path).ok()?;
        match serde_json::from_str(&contents) {
            Ok(record) => Some(record),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "unreadable cache record treated as miss");
                None
            }
        }
    }

    fn record_path(
        &self,
        path: &Path,
        operation: &str,
        params: &BTreeMap<String, String>,
    ) -> PathBuf {
        let key = compose_key(path, operation, params);
        self.root
            .join(operation)
            .join(format!("{}.json", digest_str(&key)))
    }

    fn key_lock(&self, record_path: &Path) -> Arc<Mutex<()>> {
        let mut locks = self.key_locks.lock().unwrap();
        locks
            .entry(record_path.display().to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

/// Compose the externally specified cache key:
/// canonical path + operation name + canonicalized params
fn compose_key(path: &Path, operation: &str, params: &BTreeMap<String, String>) -> String {
    let canonical = canonical_path(path);
    format!(
        "{}\n{}\n{}",
        canonical.display(),
        operation,
        canonical_params(params)
    )
}

/// Deterministic, order-independent serialization of operation params
///
/// `BTreeMap` iteration order is the canonical order.
fn canonical_params(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

fn canonical_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}
