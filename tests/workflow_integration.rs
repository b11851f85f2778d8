//! End-to-end workflow scenarios: cache warmup, persistent failures,
//! cross-pass exclusion, and parallel/sequential equivalence.

mod common;

use anyhow::anyhow;
use common::{file_fixture, workflow_in};
use millrun::workflow::{
    FileProcessor, FnProcessor, PassConfig, ResultEnvelope,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct FileStats {
    len: u64,
}

fn size_processor() -> Arc<dyn FileProcessor<FileStats>> {
    Arc::new(FnProcessor::new(|path: &Path| {
        Ok(Some(ResultEnvelope::new(FileStats {
            len: fs::metadata(path)?.len(),
        })))
    }))
}

fn size_pass(parallel: bool) -> PassConfig<FileStats> {
    PassConfig::new("sizes", "file-size", size_processor())
        .with_cache(true)
        .with_parallel(parallel)
}

#[tokio::test]
async fn first_run_processes_second_run_hits_cache() {
    let (dir, files) = file_fixture(&["a.txt", "b.txt", "c.txt"]);
    let workflow = workflow_in(&dir);
    let passes = vec![size_pass(false)];

    let first = workflow.run(files.clone(), &passes).await;
    let pr = &first.pass_results[0];
    assert_eq!(pr.processed_files, files);
    assert!(pr.cached_files.is_empty());
    assert_eq!(first.summary.cache_hit_rate, 0.0);
    assert!(pr.results.iter().all(|r| !r.cached));

    let second = workflow.run(files.clone(), &passes).await;
    let pr = &second.pass_results[0];
    assert!(pr.processed_files.is_empty());
    assert_eq!(pr.cached_files, files);
    assert_eq!(second.summary.cache_hit_rate, 100.0);
    assert!(pr.results.iter().all(|r| r.cached));

    // Cached and fresh results are interchangeable shapes.
    let fresh: Vec<_> = first.pass_results[0]
        .results
        .iter()
        .map(|r| (r.path.clone(), r.data.clone()))
        .collect();
    let cached: Vec<_> = second.pass_results[0]
        .results
        .iter()
        .map(|r| (r.path.clone(), r.data.clone()))
        .collect();
    assert_eq!(fresh, cached);
}

#[tokio::test]
async fn content_mutation_forces_reprocessing() {
    let (dir, files) = file_fixture(&["a.txt", "b.txt"]);
    let workflow = workflow_in(&dir);
    let passes = vec![size_pass(false)];

    workflow.run(files.clone(), &passes).await;
    fs::write(&files[0], "a.txt but longer now").unwrap();

    let second = workflow.run(files.clone(), &passes).await;
    let pr = &second.pass_results[0];
    assert_eq!(pr.processed_files, vec![files[0].clone()]);
    assert_eq!(pr.cached_files, vec![files[1].clone()]);
    let mutated = pr.results.iter().find(|r| r.path == files[0]).unwrap();
    assert_eq!(mutated.data.len, 20);
    assert!(!mutated.cached);
}

#[tokio::test]
async fn persistent_failure_never_blocks_other_files() {
    let (dir, files) = file_fixture(&["a.txt", "b.txt", "c.txt"]);
    let workflow = workflow_in(&dir);
    let processor: Arc<dyn FileProcessor<FileStats>> =
        Arc::new(FnProcessor::new(|path: &Path| {
            if path.file_name().unwrap() == "b.txt" {
                Err(anyhow!("permission denied"))
            } else {
                Ok(Some(ResultEnvelope::new(FileStats {
                    len: fs::metadata(path)?.len(),
                })))
            }
        }));
    let passes =
        vec![PassConfig::new("sizes", "file-size", processor).with_cache(true)];

    let first = workflow.run(files.clone(), &passes).await;
    let pr = &first.pass_results[0];
    assert_eq!(pr.errors.len(), 1);
    assert!(pr.errors[0].path.ends_with("b.txt"));
    assert_eq!(pr.results.len() + pr.errors.len(), pr.input_files.len());

    let second = workflow.run(files.clone(), &passes).await;
    let pr = &second.pass_results[0];
    // a and c hit the cache despite b failing every run.
    assert_eq!(
        pr.cached_files,
        vec![files[0].clone(), files[2].clone()]
    );
    assert_eq!(pr.processed_files, vec![files[1].clone()]);
    assert_eq!(pr.errors.len(), 1);
    assert!(pr.errors[0].path.ends_with("b.txt"));
    assert_eq!(pr.results.len() + pr.errors.len(), pr.input_files.len());
}

#[tokio::test]
async fn exclusion_flag_shrinks_the_set_for_later_passes() {
    let (dir, files) = file_fixture(&["a.txt", "b.txt", "c.txt"]);
    let workflow = workflow_in(&dir);

    let marker: Arc<dyn FileProcessor<FileStats>> =
        Arc::new(FnProcessor::new(|path: &Path| {
            let stats = FileStats {
                len: fs::metadata(path)?.len(),
            };
            if path.file_name().unwrap() == "c.txt" {
                Ok(Some(ResultEnvelope::excluded(stats)))
            } else {
                Ok(Some(ResultEnvelope::new(stats)))
            }
        }));

    let passes = vec![
        PassConfig::new("triage", "triage", marker).with_filter_remaining(true),
        PassConfig::new("sizes", "file-size", size_processor()),
    ];

    let result = workflow.run(files.clone(), &passes).await;

    assert_eq!(result.initial_files, files);
    assert_eq!(
        result.pass_results[1].input_files,
        vec![files[0].clone(), files[1].clone()]
    );
    assert_eq!(
        result.final_files,
        vec![files[0].clone(), files[1].clone()]
    );
}

#[tokio::test]
async fn parallel_and_sequential_produce_the_same_result_set() {
    let (seq_dir, seq_files) = file_fixture(&["a.txt", "bb.txt", "ccc.txt", "dddd.txt"]);
    let sequential = workflow_in(&seq_dir)
        .run(seq_files.clone(), &[size_pass(false)])
        .await;

    let (par_dir, par_files) = file_fixture(&["a.txt", "bb.txt", "ccc.txt", "dddd.txt"]);
    let parallel = workflow_in(&par_dir)
        .run(par_files.clone(), &[size_pass(true)])
        .await;

    let name_and_len = |results: &[millrun::workflow::FileOutcome<FileStats>]| {
        results
            .iter()
            .map(|r| {
                (
                    r.path.file_name().unwrap().to_string_lossy().into_owned(),
                    r.data.len,
                )
            })
            .collect::<HashSet<_>>()
    };
    assert_eq!(
        name_and_len(&sequential.pass_results[0].results),
        name_and_len(&parallel.pass_results[0].results)
    );
    assert!(parallel.pass_results[0].errors.is_empty());
}

#[tokio::test]
async fn parallel_passes_warm_and_reuse_the_cache() {
    let (dir, files) = file_fixture(&["a.txt", "b.txt", "c.txt", "d.txt", "e.txt"]);
    let workflow = workflow_in(&dir);
    let passes = vec![size_pass(true)];

    let first = workflow.run(files.clone(), &passes).await;
    assert_eq!(first.summary.total_processed, 5);

    let second = workflow.run(files.clone(), &passes).await;
    assert_eq!(second.summary.total_cached, 5);
    assert_eq!(second.summary.total_processed, 0);
    assert_eq!(second.summary.cache_hit_rate, 100.0);
}

#[tokio::test]
async fn filter_predicate_narrows_the_pass_input() {
    let (dir, files) = file_fixture(&["keep.txt", "skip.log", "keep2.txt"]);
    let workflow = workflow_in(&dir);

    let passes = vec![size_pass(false).with_filter(|path: &Path| {
        Ok(path.extension().is_some_and(|e| e == "txt"))
    })];

    let result = workflow.run(files.clone(), &passes).await;
    let pr = &result.pass_results[0];

    assert_eq!(pr.input_files.len(), 2);
    assert_eq!(pr.results.len() + pr.errors.len(), pr.input_files.len());

    let filtered = pr.filtered.as_ref().unwrap();
    assert_eq!(
        filtered.accepted.len() + filtered.rejected.len() + filtered.errors.len(),
        files.len()
    );
    assert_eq!(filtered.rejected, vec![files[1].clone()]);
}

#[tokio::test]
async fn failing_predicate_records_errors_without_aborting() {
    let (dir, files) = file_fixture(&["a.txt", "b.txt"]);
    let workflow = workflow_in(&dir);

    let passes = vec![size_pass(false).with_filter(|path: &Path| {
        if path.file_name().unwrap() == "b.txt" {
            Err(anyhow!("stat failed"))
        } else {
            Ok(true)
        }
    })];

    let result = workflow.run(files, &passes).await;
    let pr = &result.pass_results[0];

    assert_eq!(pr.input_files.len(), 1);
    assert_eq!(pr.results.len(), 1);
    let filtered = pr.filtered.as_ref().unwrap();
    assert_eq!(filtered.errors.len(), 1);
    assert!(filtered.errors[0].path.ends_with("b.txt"));
}

#[tokio::test]
async fn result_parser_decodes_cached_values() {
    let (dir, files) = file_fixture(&["a.txt"]);
    let workflow = workflow_in(&dir);

    let make_pass = || {
        size_pass(false).with_result_parser(|value| {
            let envelope: ResultEnvelope<FileStats> = serde_json::from_value(value)?;
            Ok(envelope)
        })
    };

    workflow.run(files.clone(), &[make_pass()]).await;
    let second = workflow.run(files.clone(), &[make_pass()]).await;

    let pr = &second.pass_results[0];
    assert_eq!(pr.cached_files, files);
    assert_eq!(pr.results[0].data.len, 5);
    assert!(pr.results[0].cached);
}

#[tokio::test]
async fn distinct_params_do_not_share_cache_entries() {
    let (dir, files) = file_fixture(&["a.txt"]);
    let workflow = workflow_in(&dir);

    let pass_with_depth = |depth: &str| {
        let params: std::collections::BTreeMap<String, String> =
            [("depth".to_string(), depth.to_string())].into();
        size_pass(false).with_params(params)
    };

    workflow.run(files.clone(), &[pass_with_depth("1")]).await;
    let other = workflow.run(files.clone(), &[pass_with_depth("2")]).await;

    // Same file and operation, different params: no hit.
    assert_eq!(other.pass_results[0].processed_files, files);
    assert!(other.pass_results[0].cached_files.is_empty());
}

#[tokio::test]
async fn workflow_with_no_passes_returns_inputs_untouched() {
    let (dir, files) = file_fixture(&["a.txt"]);
    let workflow = workflow_in(&dir);

    let result = workflow
        .run::<FileStats>(files.clone(), &[])
        .await;

    assert_eq!(result.initial_files, files);
    assert_eq!(result.final_files, files);
    assert!(result.pass_results.is_empty());
    assert_eq!(result.summary.cache_hit_rate, 0.0);
}

#[tokio::test]
async fn files_are_reported_missing_rather_than_dropped() {
    let (dir, mut files) = file_fixture(&["a.txt"]);
    files.push(dir.path().join("ghost.txt"));
    let workflow = workflow_in(&dir);

    let result = workflow.run(files.clone(), &[size_pass(true)]).await;
    let pr = &result.pass_results[0];

    assert_eq!(pr.results.len(), 1);
    assert_eq!(pr.errors.len(), 1);
    assert!(pr.errors[0].path.ends_with("ghost.txt"));
    assert_eq!(pr.results.len() + pr.errors.len(), pr.input_files.len());
}

#[tokio::test]
async fn sequential_results_preserve_input_order() {
    let (dir, files) = file_fixture(&["z.txt", "a.txt", "m.txt"]);
    let workflow = workflow_in(&dir);

    let result = workflow.run(files.clone(), &[size_pass(false)]).await;
    let paths: Vec<PathBuf> = result.pass_results[0]
        .results
        .iter()
        .map(|r| r.path.clone())
        .collect();
    assert_eq!(paths, files);
}
