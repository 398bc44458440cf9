use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// What [`collect_files`] picks up.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Descend into sub-directories
    pub recursive: bool,
    /// Lower-case extensions without the dot
    pub audio_extensions: Vec<String>,
    /// Extensions skipped even if listed as audio
    pub ignore_extensions: Vec<String>,
    /// Directories never entered, e.g. an output tree inside the source
    pub exclude_dirs: Vec<PathBuf>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            recursive: true,
            audio_extensions: ["wav", "mp3", "aif", "aiff", "ogg", "flac"]
                .into_iter()
                .map(String::from)
                .collect(),
            ignore_extensions: ["asd", "ds_store", "ini", "txt", "md"]
                .into_iter()
                .map(String::from)
                .collect(),
            exclude_dirs: Vec::new(),
        }
    }
}

impl ScanOptions {
    fn accepts(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
            return false;
        };
        let ext = ext.to_lowercase();
        !self.ignore_extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext))
            && self.audio_extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext))
    }
}

/// Collect audio files under `root`, sorted by path.
///
/// Hidden entries (leading `.`) are skipped, as are directories listed in
/// [`ScanOptions::exclude_dirs`]. Unreadable entries are logged and skipped.
pub fn collect_files(root: &Path, options: &ScanOptions) -> Vec<PathBuf> {
    let max_depth = if options.recursive { usize::MAX } else { 1 };

    let walker = WalkDir::new(root)
        .max_depth(max_depth)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_skipped_entry(entry, options));

    let mut files: Vec<PathBuf> = walker
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(target: "scanner", error = %e, "Skipping unreadable entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && options.accepts(entry.path()))
        .map(DirEntry::into_path)
        .collect();

    files.sort();
    tracing::info!(target: "scanner", root = %root.display(), files = files.len(), "Scan complete");
    files
}

fn is_skipped_entry(entry: &DirEntry, options: &ScanOptions) -> bool {
    let hidden = entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'));
    hidden
        || (entry.file_type().is_dir()
            && options.exclude_dirs.iter().any(|dir| entry.path() == dir))
}
