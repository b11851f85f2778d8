//! Pass filter: three-way partition of a file set by predicate
//!
//! Every input path lands in exactly one of `accepted`, `rejected`, or
//! `errors`, so the caller can always account for the full input set. A
//! predicate failure never aborts the batch.

use crate::workflow::FileError;
use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Partition produced by [`filter_paths`]
#[derive(Debug, Clone, Default)]
pub struct FilterOutcome {
    /// Paths the predicate accepted, in input order
    pub accepted: Vec<PathBuf>,
    /// Paths the predicate rejected, in input order
    pub rejected: Vec<PathBuf>,
    /// Paths whose predicate invocation failed
    pub errors: Vec<FileError>,
}

/// Run a predicate over every path, capturing failures per file
pub fn filter_paths<F>(paths: &[PathBuf], predicate: F) -> FilterOutcome
where
    F: Fn(&Path) -> Result<bool>,
{
    let mut outcome = FilterOutcome::default();

    for path in paths {
        match predicate(path) {
            Ok(true) => outcome.accepted.push(path.clone()),
            Ok(false) => outcome.rejected.push(path.clone()),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "filter predicate failed");
                outcome.errors.push(FileError::new(path.clone(), e.to_string()));
            }
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn partitions_accepted_and_rejected_in_order() {
        let input = paths(&["a.txt", "b.log", "c.txt", "d.log"]);
        let outcome = filter_paths(&input, |p| {
            Ok(p.extension().is_some_and(|e| e == "txt"))
        });

        assert_eq!(outcome.accepted, paths(&["a.txt", "c.txt"]));
        assert_eq!(outcome.rejected, paths(&["b.log", "d.log"]));
        assert!(outcome.errors.is_empty());
    }

    #[test]
    fn predicate_error_routes_to_errors_only() {
        let input = paths(&["a", "bad", "c"]);
        let outcome = filter_paths(&input, |p| {
            if p == Path::new("bad") {
                Err(anyhow!("unreadable"))
            } else {
                Ok(true)
            }
        });

        assert_eq!(outcome.accepted, paths(&["a", "c"]));
        assert!(outcome.rejected.is_empty());
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].path, PathBuf::from("bad"));
        assert!(outcome.errors[0].message.contains("unreadable"));
    }

    #[test]
    fn every_path_is_accounted_for_even_when_all_error() {
        let input = paths(&["x", "y", "z"]);
        let outcome = filter_paths(&input, |_| Err(anyhow!("always fails")));

        assert_eq!(
            outcome.accepted.len() + outcome.rejected.len() + outcome.errors.len(),
            input.len()
        );
        assert_eq!(outcome.errors.len(), 3);
    }

    #[test]
    fn empty_input_is_empty_output() {
        let outcome = filter_paths(&[], |_| Ok(true));
        assert!(outcome.accepted.is_empty());
        assert!(outcome.rejected.is_empty());
        assert!(outcome.errors.is_empty());
    }
}
