//! Placing classified samples into the output taxonomy.
//!
//! Destinations are `<output>/<folder path…>/<file name>`. Files are copied
//! by default or moved on request; an existing destination is skipped unless
//! overwriting is enabled. Name collisions are not resolved.
//!
//! # Features
//! - Pre-creation of the full taxonomy tree
//! - Dry-run friendly planning separate from the file operation
//! - Cross-device moves via copy + delete

use anyhow::{Context, Result};
use filetime::FileTime;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::classifier::ClassificationResult;
use crate::patterns::{PatternRegistry, UNKNOWN_CATEGORY, UNMATCHED_SAMPLES};

/// Directory under the output root holding run reports.
pub const REPORTS_DIR: &str = "reports";

/// Longest file name most filesystems accept, in bytes.
const MAX_FILENAME_BYTES: usize = 255;

/// Whether the source file is kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferMode {
    #[default]
    Copy,
    Move,
}

/// Where one file would go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedMove {
    pub source: PathBuf,
    pub destination: PathBuf,
}

/// What [`apply`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    Copied(PathBuf),
    Moved(PathBuf),
    /// Destination already existed and overwriting is off
    Skipped(PathBuf),
}

impl MoveOutcome {
    pub fn destination(&self) -> &Path {
        match self {
            MoveOutcome::Copied(p) | MoveOutcome::Moved(p) | MoveOutcome::Skipped(p) => p,
        }
    }
}

/// Create every leaf directory of the taxonomy, plus the unmatched and
/// report directories. Returns the number of directories ensured.
pub fn create_taxonomy(output_root: &Path, registry: &PatternRegistry) -> Result<usize> {
    let mut dirs: Vec<PathBuf> = registry
        .folder_paths()
        .iter()
        .map(|segments| join_segments(output_root, segments))
        .collect();
    dirs.push(output_root.join(UNKNOWN_CATEGORY).join(UNMATCHED_SAMPLES));
    dirs.push(output_root.join(REPORTS_DIR));

    for dir in &dirs {
        fs::create_dir_all(dir).with_context(|| format!("Failed to create directory: {:?}", dir))?;
    }

    tracing::info!(target: "organizer", root = %output_root.display(), directories = dirs.len(), "Taxonomy ready");
    Ok(dirs.len())
}

/// Compute the destination of `source` for a classification.
pub fn plan(source: &Path, output_root: &Path, result: &ClassificationResult) -> PlannedMove {
    let file_name = source
        .file_name()
        .map(|n| sanitize_filename(&n.to_string_lossy()))
        .unwrap_or_else(|| "unnamed".to_string());

    PlannedMove {
        source: source.to_path_buf(),
        destination: join_segments(output_root, &result.folder_path).join(file_name),
    }
}

/// Carry out a planned move.
pub fn apply(plan: &PlannedMove, mode: TransferMode, overwrite: bool) -> Result<MoveOutcome> {
    let PlannedMove {
        source,
        destination,
    } = plan;

    if destination.exists() && (!overwrite || same_file(source, destination)) {
        tracing::debug!(target: "organizer", destination = %destination.display(), "Destination exists, skipping");
        return Ok(MoveOutcome::Skipped(destination.clone()));
    }

    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }

    match mode {
        TransferMode::Copy => {
            copy_with_times(source, destination)?;
            Ok(MoveOutcome::Copied(destination.clone()))
        }
        TransferMode::Move => {
            if fs::rename(source, destination).is_err() {
                // If rename fails (cross-device), try copy + delete
                copy_with_times(source, destination)?;
                fs::remove_file(source)
                    .with_context(|| format!("Failed to remove source file: {:?}", source))?;
            }
            Ok(MoveOutcome::Moved(destination.clone()))
        }
    }
}

/// Copy contents and permissions, then carry over access and modification times.
fn copy_with_times(source: &Path, destination: &Path) -> Result<()> {
    fs::copy(source, destination)
        .with_context(|| format!("Failed to copy file to: {:?}", destination))?;
    let metadata = fs::metadata(source)
        .with_context(|| format!("Failed to read metadata: {:?}", source))?;
    filetime::set_file_times(
        destination,
        FileTime::from_last_access_time(&metadata),
        FileTime::from_last_modification_time(&metadata),
    )
    .with_context(|| format!("Failed to set file times: {:?}", destination))
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn join_segments(root: &Path, segments: &[String]) -> PathBuf {
    segments
        .iter()
        .fold(root.to_path_buf(), |path, segment| path.join(sanitize_filename(segment)))
}

/// Replace characters that are invalid in file names and cap the length
/// at 255 bytes, keeping the extension.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect();

    if cleaned.len() <= MAX_FILENAME_BYTES {
        return cleaned;
    }

    let (stem, ext) = match cleaned.rfind('.') {
        Some(dot) if dot > 0 && cleaned.len() - dot <= 16 => cleaned.split_at(dot),
        _ => (cleaned.as_str(), ""),
    };
    let budget = MAX_FILENAME_BYTES - ext.len();
    let mut end = budget.min(stem.len());
    while !stem.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}{}", &stem[..end], ext)
}
