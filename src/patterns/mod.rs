//! Pattern configuration and the compiled rule set.
//!
//! # Architecture
//!
//! - **Raw document** (`raw.rs`) - serde shapes of `patterns.json`, order-preserving
//! - **Taxonomy walk** (`taxonomy.rs`) - placing a category path and tag in the folder tree
//! - **Thresholds** (`thresholds.rs`) - duration thresholds and verdicts
//! - **Registry** (`registry.rs`) - compiled, immutable matchers built from the document
//!
//! The registry is validated once at construction and never mutated
//! afterwards, so it can be shared across worker threads behind an `Arc`.
//!
//! # Usage
//!
//! ```ignore
//! use sample_sorter::patterns::PatternRegistry;
//!
//! let registry = PatternRegistry::embedded()?;
//! let hits = registry.match_category("Kick_Loop_120bpm");
//! assert_eq!(hits[0].category, "DRUMS");
//! ```

mod raw;
mod registry;
mod taxonomy;
mod thresholds;
mod types;

pub use raw::{
    BoundaryMacros, CategorySpec, DEFAULT_PATTERNS_JSON, FolderNode, OrderedMap, PatternConfig,
    ThresholdNode,
};
pub use registry::{CategoryMatch, PatternRegistry};
pub use taxonomy::split_path_key;
pub use thresholds::Thresholds;
pub use types::{DurationVerdict, SampleType};

use std::path::{Path, PathBuf};

/// Category assigned when no main pattern matches.
pub const UNKNOWN_CATEGORY: &str = "UNKNOWN";

/// Folder under [`UNKNOWN_CATEGORY`] receiving unmatched samples.
pub const UNMATCHED_SAMPLES: &str = "UNMATCHED_SAMPLES";

/// Errors raised while building a [`PatternRegistry`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read pattern file {0}: {1}")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Malformed pattern document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid pattern in {scope}: {pattern}")]
    InvalidPattern {
        scope: String,
        pattern: String,
        #[source]
        source: Box<fancy_regex::Error>,
    },

    #[error("Category {category} from {section} has no classification priority")]
    MissingPriority { category: String, section: &'static str },

    #[error("Category {0} has no entry in folder_structure")]
    MissingFolder(String),

    #[error("folder_structure is empty")]
    EmptyFolderStructure,

    #[error("base_patterns has no {0} entry")]
    MissingBaseTag(&'static str),

    #[error("Sub-pattern {category}/{key} does not resolve in folder_structure")]
    UnresolvedSubPattern { category: String, key: String },
}

/// The part of a file name that patterns are matched against.
///
/// Directories and the extension are dropped, so `"a/b/Kick_01.wav"`
/// becomes `"Kick_01"`.
pub fn sample_stem(filename: &str) -> &str {
    Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename)
}
