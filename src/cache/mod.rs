//! Skip-if-unchanged bookkeeping for organized samples.
//!
//! - **Keys** (`key.rs`) - metadata or partial content hash per file
//! - **Store** (`store.rs`) - thread-safe path → key map persisted as JSON
//!
//! The cache is a pure optimization: a miss only means a file gets
//! classified again.

mod key;
mod store;

pub use key::{CacheKey, CacheKeyStrategy};
pub use store::{CacheEntry, CacheStats, ProcessedCache};

use std::path::PathBuf;

/// Cache persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache I/O failed for {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Failed to serialize cache: {0}")]
    Serialize(#[from] serde_json::Error),
}
