//! Shared fixtures for integration tests

use millrun::cache::FingerprintCache;
use millrun::config::EngineConfig;
use millrun::workflow::WorkflowProcessor;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Create a temp dir populated with the named files, contents = file name
pub fn file_fixture(names: &[&str]) -> (TempDir, Vec<PathBuf>) {
    let dir = TempDir::new().unwrap();
    let files = names
        .iter()
        .map(|name| {
            let path = dir.path().join(name);
            fs::write(&path, name).unwrap();
            path
        })
        .collect();
    (dir, files)
}

/// Build a workflow processor whose cache lives under the fixture dir
pub fn workflow_in(dir: &TempDir) -> WorkflowProcessor {
    init_tracing();
    let cache = FingerprintCache::new(dir.path().join("cache")).unwrap();
    WorkflowProcessor::new(cache, EngineConfig::default())
}

/// Install a tracing subscriber once so RUST_LOG works in test runs
fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
