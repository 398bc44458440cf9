//! Application settings stored as TOML.
//!
//! Settings live in the OS-standard config directory:
//! - Windows: %APPDATA%\sample-sorter\config.toml
//! - macOS: ~/Library/Application Support/sample-sorter/config.toml
//! - Linux: ~/.config/sample-sorter/config.toml
//!
//! The file is human-readable and every section is optional. Command-line
//! flags override whatever is loaded here.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cache::{CacheKeyStrategy, ProcessedCache};
use crate::organizer::TransferMode;
use crate::processor::ProcessOptions;
use crate::scanner::ScanOptions;

/// Default cache file name inside the output directory.
pub const CACHE_FILE_NAME: &str = ".sample_cache.json";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub processing: ProcessingConfig,
    pub cache: CacheConfig,
}

/// Where samples come from and go to
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub source_path: PathBuf,
    pub output_path: PathBuf,
    /// Custom pattern document (None = built-in patterns)
    pub patterns_file: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            source_path: PathBuf::from("."),
            output_path: PathBuf::from("./organized_samples"),
            patterns_file: None,
        }
    }
}

/// Batch processing behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Worker threads (0 = one per core)
    pub threads: usize,
    pub process_subfolders: bool,
    pub overwrite_existing: bool,
    /// Move instead of copy
    pub move_files: bool,
    pub generate_report: bool,
    pub enable_duration_analysis: bool,
    /// Use enclosing folder names when the file name says nothing
    pub use_folder_names: bool,
    pub audio_extensions: Vec<String>,
    pub ignore_extensions: Vec<String>,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        let scan = ScanOptions::default();
        Self {
            threads: 0,
            process_subfolders: scan.recursive,
            overwrite_existing: false,
            move_files: false,
            generate_report: true,
            enable_duration_analysis: true,
            use_folder_names: true,
            audio_extensions: scan.audio_extensions,
            ignore_extensions: scan.ignore_extensions,
        }
    }
}

/// Skip-if-unchanged cache
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub strategy: CacheKeyStrategy,
    /// Cache location (None = inside the output directory)
    pub file: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            strategy: CacheKeyStrategy::Metadata,
            file: None,
        }
    }
}

impl Config {
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            recursive: self.processing.process_subfolders,
            audio_extensions: normalize_extensions(&self.processing.audio_extensions),
            ignore_extensions: normalize_extensions(&self.processing.ignore_extensions),
            exclude_dirs: Vec::new(),
        }
    }

    /// Processor options for the configured source and output.
    pub fn process_options(&self) -> ProcessOptions {
        let mut options =
            ProcessOptions::new(&self.paths.source_path, &self.paths.output_path);
        options.scan = self.scan_options();
        options.mode = if self.processing.move_files {
            TransferMode::Move
        } else {
            TransferMode::Copy
        };
        options.overwrite = self.processing.overwrite_existing;
        options.threads = self.processing.threads;
        options.use_folder_names = self.processing.use_folder_names;
        options
    }

    pub fn cache_file(&self) -> PathBuf {
        self.cache
            .file
            .clone()
            .unwrap_or_else(|| self.paths.output_path.join(CACHE_FILE_NAME))
    }

    /// The configured cache, or None when disabled.
    pub fn open_cache(&self) -> Option<ProcessedCache> {
        self.cache
            .enabled
            .then(|| ProcessedCache::load(self.cache_file(), self.cache.strategy))
    }
}

/// Accept `.WAV` as well as `wav`.
fn normalize_extensions(exts: &[String]) -> Vec<String> {
    exts.iter()
        .map(|e| e.trim().trim_start_matches('.').to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

// ============================================================================
// Config File Operations
// ============================================================================

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("sample-sorter"))
}

/// Get the full path to the config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Load configuration from the default location.
///
/// Never fails: a missing or broken file yields the defaults.
pub fn load() -> Config {
    let Some(path) = config_path() else {
        tracing::warn!(target: "config", "Could not determine config directory, using defaults");
        return Config::default();
    };
    load_from(&path)
}

/// Load configuration from `path`, falling back to defaults.
pub fn load_from(path: &Path) -> Config {
    if !path.exists() {
        tracing::debug!(target: "config", path = %path.display(), "No config file, using defaults");
        return Config::default();
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => {
                tracing::info!(target: "config", path = %path.display(), "Loaded config");
                config
            }
            Err(e) => {
                tracing::error!(target: "config", path = %path.display(), error = %e, "Failed to parse config file");
                tracing::warn!(target: "config", "Using default configuration");
                Config::default()
            }
        },
        Err(e) => {
            tracing::error!(target: "config", path = %path.display(), error = %e, "Failed to read config file");
            Config::default()
        }
    }
}

/// Save configuration to the default location.
pub fn save(config: &Config) -> Result<PathBuf, SettingsError> {
    let path = config_path().ok_or(SettingsError::NoConfigDir)?;
    save_to(config, &path)?;
    Ok(path)
}

/// Write `config` to `path` atomically (temp file, then rename).
pub fn save_to(config: &Config, path: &Path) -> Result<(), SettingsError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| SettingsError::CreateDir(dir.to_path_buf(), e))?;
    }

    let contents = toml::to_string_pretty(config).map_err(SettingsError::Serialize)?;

    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, &contents)
        .map_err(|e| SettingsError::Write(temp_path.clone(), e))?;
    std::fs::rename(&temp_path, path)
        .map_err(|e| SettingsError::Rename(temp_path, path.to_path_buf(), e))?;

    tracing::info!(target: "config", path = %path.display(), "Saved config");
    Ok(())
}

// ============================================================================
// Error Types
// ============================================================================

/// Settings persistence errors
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to create config directory {0}: {1}")]
    CreateDir(PathBuf, std::io::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),

    #[error("Failed to write config to {0}: {1}")]
    Write(PathBuf, std::io::Error),

    #[error("Failed to rename temp file {0} to {1}: {2}")]
    Rename(PathBuf, PathBuf, std::io::Error),
}

// ============================================================================
// Tests
// ============================================================================
