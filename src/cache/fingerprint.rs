//! Content fingerprinting for cache staleness detection

use crate::error::{MillrunError, MillrunResult};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Compute the SHA-256 content fingerprint of a file
///
/// The fingerprint changes whenever the file's bytes change, which is what
/// drives cache invalidation: a stored record whose fingerprint no longer
/// matches the file on disk is stale.
pub fn fingerprint_file(path: &Path) -> MillrunResult<String> {
    let mut file = File::open(path).map_err(|e| {
        MillrunError::cache_with_path("failed to open file for fingerprinting", path)
            .with_source(e)
    })?;

    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    loop {
        let read = file.read(&mut buffer).map_err(|e| {
            MillrunError::cache_with_path("failed to read file for fingerprinting", path)
                .with_source(e)
        })?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Hash an arbitrary string into a filesystem-safe hex digest
pub fn digest_str(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}
