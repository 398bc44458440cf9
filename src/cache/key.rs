//! Cache keys for change detection.
//!
//! Two strategies: cheap file metadata (size and modification time), or a
//! partial content hash that survives touch-only changes. The content hash
//! reads only the first and last 1MB.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;
use std::time::UNIX_EPOCH;

/// How a file's cache key is computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheKeyStrategy {
    #[default]
    Metadata,
    ContentHash,
}

impl CacheKeyStrategy {
    /// Compute the current key of `path`.
    pub fn key_for(&self, path: &Path) -> io::Result<CacheKey> {
        match self {
            CacheKeyStrategy::Metadata => metadata_key(path),
            CacheKeyStrategy::ContentHash => content_key(path),
        }
    }
}

/// Snapshot of a file that changes whenever the file does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CacheKey {
    Metadata { size: u64, modified_ns: u64 },
    ContentHash { size: u64, sha256: String },
}

fn metadata_key(path: &Path) -> io::Result<CacheKey> {
    let metadata = std::fs::metadata(path)?;
    // Filesystems without mtimes fall back to size alone
    let modified_ns = metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);

    Ok(CacheKey::Metadata {
        size: metadata.len(),
        modified_ns,
    })
}

/// Bytes hashed at each end of a file.
const HASH_WINDOW: u64 = 1024 * 1024;

/// Size plus a SHA-256 over the head and tail windows; the middle of a
/// large file is skipped. Files no larger than two windows are hashed whole.
fn content_key(path: &Path) -> io::Result<CacheKey> {
    let mut file = File::open(path)?;
    let size = file.metadata()?.len();

    let mut hasher = Sha256::new();
    hasher.update(size.to_le_bytes());

    let head = size.min(HASH_WINDOW);
    io::copy(&mut (&mut file).take(head), &mut hasher)?;

    let tail_start = size.saturating_sub(HASH_WINDOW).max(head);
    if tail_start < size {
        file.seek(SeekFrom::Start(tail_start))?;
        io::copy(&mut file, &mut hasher)?;
    }

    Ok(CacheKey::ContentHash {
        size,
        sha256: format!("{:x}", hasher.finalize()),
    })
}
