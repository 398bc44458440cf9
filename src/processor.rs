//! Batch organization of a sample folder.
//!
//! Scans the source tree, classifies every file in parallel with rayon and
//! copies or moves it into the output taxonomy. Per-file failures are
//! collected into the run statistics; they never stop the batch.

use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use rayon::prelude::*;

use crate::analyzer::{DurationProbe, LoftyProbe};
use crate::cache::ProcessedCache;
use crate::classifier::{ClassificationResult, Classifier, Confidence};
use crate::error::{Error, Result};
use crate::organizer::{self, MoveOutcome, TransferMode};
use crate::scanner::{self, ScanOptions};

/// Files between progress log lines.
const PROGRESS_EVERY: usize = 100;

/// Settings for one run.
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    pub source: PathBuf,
    pub output: PathBuf,
    pub scan: ScanOptions,
    pub mode: TransferMode,
    pub overwrite: bool,
    /// Classify and plan only; nothing on disk changes
    pub dry_run: bool,
    /// Worker threads, 0 uses the global rayon pool
    pub threads: usize,
    /// Fall back to the names of folders below `source`
    pub use_folder_names: bool,
}

impl ProcessOptions {
    pub fn new(source: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            output: output.into(),
            scan: ScanOptions::default(),
            mode: TransferMode::Copy,
            overwrite: false,
            dry_run: false,
            threads: 0,
            use_folder_names: true,
        }
    }
}

/// What happened to one file.
#[derive(Debug, Clone, PartialEq)]
pub enum FileStatus {
    /// Unchanged since a previous run
    Cached,
    /// Dry run; the destination was computed only
    Planned,
    Transferred(MoveOutcome),
    Failed(String),
}

/// Per-file record of a run.
#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub source: PathBuf,
    pub status: FileStatus,
    pub classification: Option<ClassificationResult>,
    pub duration: Option<f64>,
    pub destination: Option<PathBuf>,
}

/// Aggregate counters for a run.
#[derive(Debug, Clone, Default)]
pub struct ProcessStats {
    pub total: usize,
    /// Copied or moved
    pub processed: usize,
    pub skipped_cached: usize,
    /// Destination already existed
    pub skipped_existing: usize,
    pub planned: usize,
    pub failed: usize,
    pub low_confidence: usize,
    /// Files per destination directory
    pub destinations: BTreeMap<String, usize>,
    // SmallVec: most runs have 0-8 errors, avoid heap allocation
    pub errors: SmallVec<[String; 8]>,
    pub elapsed: Duration,
}

impl ProcessStats {
    fn record(&mut self, outcome: &FileOutcome) {
        self.total += 1;
        match &outcome.status {
            FileStatus::Cached => self.skipped_cached += 1,
            FileStatus::Planned => self.planned += 1,
            FileStatus::Transferred(MoveOutcome::Skipped(_)) => self.skipped_existing += 1,
            FileStatus::Transferred(_) => self.processed += 1,
            FileStatus::Failed(message) => {
                self.failed += 1;
                self.errors
                    .push(format!("{}: {}", outcome.source.display(), message));
            }
        }

        if let Some(result) = &outcome.classification {
            if result.confidence == Confidence::Low {
                self.low_confidence += 1;
            }
            if !matches!(outcome.status, FileStatus::Failed(_)) {
                *self.destinations.entry(result.destination()).or_default() += 1;
            }
        }
    }
}

/// Outcome of [`Processor::run`].
#[derive(Debug, Clone)]
pub struct ProcessRun {
    pub stats: ProcessStats,
    /// In scan order
    pub files: Vec<FileOutcome>,
}

/// Drives scanning, classification and file placement.
pub struct Processor {
    classifier: Classifier,
    probe: Box<dyn DurationProbe>,
    cache: Option<ProcessedCache>,
    options: ProcessOptions,
}

impl Processor {
    /// A processor reading durations with lofty and without a cache.
    pub fn new(classifier: Classifier, options: ProcessOptions) -> Self {
        Self {
            classifier,
            probe: Box::new(LoftyProbe),
            cache: None,
            options,
        }
    }

    pub fn with_probe(mut self, probe: impl DurationProbe + 'static) -> Self {
        self.probe = Box::new(probe);
        self
    }

    pub fn with_cache(mut self, cache: ProcessedCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn cache(&self) -> Option<&ProcessedCache> {
        self.cache.as_ref()
    }

    pub fn options(&self) -> &ProcessOptions {
        &self.options
    }

    /// Organize every sample under the source directory.
    pub fn run(&self) -> Result<ProcessRun> {
        let started = Instant::now();
        let options = &self.options;

        if !options.source.is_dir() {
            return Err(Error::not_found(&options.source));
        }

        let mut scan = options.scan.clone();
        scan.exclude_dirs.push(options.output.clone());
        if let Ok(output) = options.output.canonicalize() {
            scan.exclude_dirs.push(output);
        }
        let files = scanner::collect_files(&options.source, &scan);

        tracing::info!(
            target: "processor",
            source = %options.source.display(),
            output = %options.output.display(),
            files = files.len(),
            mode = ?options.mode,
            dry_run = options.dry_run,
            "Starting run"
        );

        if !options.dry_run {
            organizer::create_taxonomy(&options.output, self.classifier.registry())
                .map_err(|e| Error::organization(format!("{:#}", e)))?;
        }

        let done = AtomicUsize::new(0);
        let total = files.len();
        let work = || -> Vec<FileOutcome> {
            files
                .par_iter()
                .map(|path| {
                    let outcome = self.process_file(path);
                    let n = done.fetch_add(1, Ordering::Relaxed) + 1;
                    if n % PROGRESS_EVERY == 0 || n == total {
                        tracing::info!(target: "processor", done = n, total, "Progress");
                    }
                    outcome
                })
                .collect()
        };

        let outcomes = if options.threads > 0 {
            rayon::ThreadPoolBuilder::new()
                .num_threads(options.threads)
                .build()?
                .install(work)
        } else {
            work()
        };

        let mut stats = ProcessStats::default();
        for outcome in &outcomes {
            stats.record(outcome);
        }

        if !options.dry_run
            && let Some(cache) = &self.cache
            && let Err(e) = cache.save()
        {
            tracing::warn!(target: "processor", error = %e, "Failed to save cache");
            stats.errors.push(format!("cache: {}", e));
        }

        stats.elapsed = started.elapsed();
        tracing::info!(
            target: "processor",
            total = stats.total,
            processed = stats.processed,
            cached = stats.skipped_cached,
            existing = stats.skipped_existing,
            planned = stats.planned,
            failed = stats.failed,
            low_confidence = stats.low_confidence,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            "Run complete"
        );

        Ok(ProcessRun {
            stats,
            files: outcomes,
        })
    }

    fn process_file(&self, path: &Path) -> FileOutcome {
        let options = &self.options;

        if !options.dry_run
            && let Some(cache) = &self.cache
            && cache.is_cached(path)
        {
            tracing::debug!(target: "processor", path = %path.display(), "Unchanged, skipping");
            return FileOutcome {
                source: path.to_path_buf(),
                status: FileStatus::Cached,
                classification: None,
                duration: None,
                destination: cache.destination_of(path).map(|d| options.output.join(d)),
            };
        }

        let duration = self.probe.duration(path);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let folders = if options.use_folder_names {
            folders_below(&options.source, path)
        } else {
            Vec::new()
        };
        let result = self.classifier.classify_with_folders(&name, &folders, duration);
        let planned = organizer::plan(path, &options.output, &result);

        if options.dry_run {
            return FileOutcome {
                source: path.to_path_buf(),
                status: FileStatus::Planned,
                destination: Some(planned.destination),
                classification: Some(result),
                duration,
            };
        }

        // Key first: a moved file can no longer be hashed
        let key = self.cache.as_ref().map(|cache| cache.key_for(path));

        let status = match organizer::apply(&planned, options.mode, options.overwrite) {
            Ok(outcome) => {
                if let (Some(cache), Some(Ok(key))) = (&self.cache, key) {
                    cache.insert(path, key, result.destination());
                }
                FileStatus::Transferred(outcome)
            }
            Err(e) => {
                tracing::warn!(target: "processor", path = %path.display(), error = %format!("{:#}", e), "Failed to organize");
                FileStatus::Failed(format!("{:#}", e))
            }
        };

        FileOutcome {
            source: path.to_path_buf(),
            status,
            destination: Some(planned.destination),
            classification: Some(result),
            duration,
        }
    }
}

/// Names of the folders between `root` and the file, outermost first.
fn folders_below(root: &Path, path: &Path) -> Vec<String> {
    path.parent()
        .and_then(|parent| parent.strip_prefix(root).ok())
        .map(folder_names)
        .unwrap_or_default()
}

/// Plain folder names of a relative directory; `.`, `..` and roots are dropped.
pub fn folder_names(dir: &Path) -> Vec<String> {
    dir.components()
        .filter_map(|c| match c {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect()
}
