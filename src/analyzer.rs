//! Sample duration measurement.
//!
//! Durations come from container properties via lofty; no audio is
//! decoded. Anything lofty cannot read simply has no duration, and the
//! classifier falls back to file-name signals.

use lofty::file::AudioFile;
use lofty::probe::Probe;
use std::path::Path;

/// Source of sample durations for the batch processor.
pub trait DurationProbe: Send + Sync {
    /// Duration in seconds, `None` when unknown or unreadable.
    fn duration(&self, path: &Path) -> Option<f64>;
}

/// Reads durations with lofty.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoftyProbe;

impl DurationProbe for LoftyProbe {
    fn duration(&self, path: &Path) -> Option<f64> {
        measure_duration(path)
    }
}

/// Never reports a duration. Used when duration analysis is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDuration;

impl DurationProbe for NoDuration {
    fn duration(&self, _path: &Path) -> Option<f64> {
        None
    }
}

/// Measure a file's duration in seconds.
///
/// Errors and zero-length results are both reported as `None`.
pub fn measure_duration(path: &Path) -> Option<f64> {
    // File type comes from the extension, which the scanner already vetted
    match Probe::open(path).and_then(|probe| probe.read()) {
        Ok(file) => {
            let seconds = file.properties().duration().as_secs_f64();
            if seconds > 0.0 {
                Some(seconds)
            } else {
                tracing::debug!(target: "analyzer", path = %path.display(), "Zero-length duration");
                None
            }
        }
        Err(e) => {
            tracing::debug!(target: "analyzer", path = %path.display(), error = %e, "Could not read duration");
            None
        }
    }
}
