//! Persistent record of already-organized samples.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use super::CacheError;
use super::key::{CacheKey, CacheKeyStrategy};

/// What the cache remembers about one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: CacheKey,
    /// Destination directory relative to the output root
    pub destination: String,
}

/// Counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheFile {
    version: u32,
    entries: BTreeMap<String, CacheEntry>,
}

const CACHE_VERSION: u32 = 1;

/// Skip-if-unchanged cache keyed by source path.
///
/// Safe to share across worker threads; lookups and inserts take a short lock.
#[derive(Debug)]
pub struct ProcessedCache {
    file: Option<PathBuf>,
    strategy: CacheKeyStrategy,
    entries: Mutex<BTreeMap<String, CacheEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ProcessedCache {
    /// An empty cache that is never persisted.
    pub fn in_memory(strategy: CacheKeyStrategy) -> Self {
        Self {
            file: None,
            strategy,
            entries: Mutex::new(BTreeMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Load the cache stored at `file`.
    ///
    /// A missing file starts empty. A corrupt or incompatible file is
    /// logged and also starts empty; it is overwritten on the next save.
    pub fn load(file: impl Into<PathBuf>, strategy: CacheKeyStrategy) -> Self {
        let file = file.into();
        let mut cache = Self::in_memory(strategy);

        match std::fs::read_to_string(&file) {
            Ok(contents) => match serde_json::from_str::<CacheFile>(&contents) {
                Ok(stored) if stored.version == CACHE_VERSION => {
                    tracing::info!(
                        target: "cache",
                        path = %file.display(),
                        entries = stored.entries.len(),
                        "Loaded processed-file cache"
                    );
                    *cache.entries.get_mut() = stored.entries;
                }
                Ok(stored) => {
                    tracing::warn!(
                        target: "cache",
                        path = %file.display(),
                        version = stored.version,
                        "Ignoring cache written by another version"
                    );
                }
                Err(e) => {
                    tracing::warn!(target: "cache", path = %file.display(), error = %e, "Cache file is corrupt, starting empty");
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(target: "cache", path = %file.display(), "No cache file yet");
            }
            Err(e) => {
                tracing::warn!(target: "cache", path = %file.display(), error = %e, "Could not read cache file, starting empty");
            }
        }

        cache.file = Some(file);
        cache
    }

    pub fn strategy(&self) -> CacheKeyStrategy {
        self.strategy
    }

    /// Current key of `path` under this cache's strategy.
    pub fn key_for(&self, path: &Path) -> Result<CacheKey, CacheError> {
        self.strategy.key_for(path).map_err(|e| CacheError::Io(path.to_path_buf(), e))
    }

    /// Whether `path` was recorded and has not changed since.
    ///
    /// Unreadable files count as not cached.
    pub fn is_cached(&self, path: &Path) -> bool {
        let hit = match self.key_for(path) {
            Ok(current) => self
                .entries
                .lock()
                .get(&entry_name(path))
                .is_some_and(|entry| entry.key == current),
            Err(_) => false,
        };

        let counter = if hit { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        hit
    }

    /// Remember `path` with its current key.
    pub fn record(&self, path: &Path, destination: impl Into<String>) -> Result<(), CacheError> {
        let key = self.key_for(path)?;
        self.insert(path, key, destination);
        Ok(())
    }

    /// Remember `path` with a key computed earlier, e.g. before the file was moved.
    pub fn insert(&self, path: &Path, key: CacheKey, destination: impl Into<String>) {
        self.entries.lock().insert(
            entry_name(path),
            CacheEntry {
                key,
                destination: destination.into(),
            },
        );
    }

    /// Last recorded destination of `path`.
    pub fn destination_of(&self, path: &Path) -> Option<String> {
        self.entries
            .lock()
            .get(&entry_name(path))
            .map(|e| e.destination.clone())
    }

    /// Forget `path`. Returns whether it was present.
    pub fn invalidate(&self, path: &Path) -> bool {
        self.entries.lock().remove(&entry_name(path)).is_some()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Write the cache to its file, if it has one.
    ///
    /// Writes atomically (write to temp, then rename).
    pub fn save(&self) -> Result<(), CacheError> {
        let Some(path) = &self.file else {
            return Ok(());
        };

        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
        {
            std::fs::create_dir_all(dir).map_err(|e| CacheError::Io(dir.to_path_buf(), e))?;
        }

        let stored = CacheFile {
            version: CACHE_VERSION,
            entries: self.entries.lock().clone(),
        };
        let contents = serde_json::to_string_pretty(&stored)?;

        let temp_path = path.with_extension("json.tmp");
        std::fs::write(&temp_path, contents).map_err(|e| CacheError::Io(temp_path.clone(), e))?;
        std::fs::rename(&temp_path, path).map_err(|e| CacheError::Io(path.clone(), e))?;

        tracing::info!(target: "cache", path = %path.display(), entries = stored.entries.len(), "Saved processed-file cache");
        Ok(())
    }
}

fn entry_name(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
