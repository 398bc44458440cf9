//! Run reports.
//!
//! Every organize run can leave two files under `<output>/reports/`: a
//! pretty-printed JSON document with one entry per file, and a plain text
//! summary for humans. Both carry the same timestamp in their names.

use chrono::Local;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::cache::CacheStats;
use crate::error::{Result, ResultExt};
use crate::organizer::{MoveOutcome, REPORTS_DIR};
use crate::processor::{FileStatus, ProcessRun};

/// One line of the report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry {
    pub file: PathBuf,
    pub status: &'static str,
    /// Absent for files skipped by the cache
    pub category: Option<String>,
    pub subcategory: Option<String>,
    /// `LOOP`, `ONE SHOT` or `UNDEFINED`
    #[serde(rename = "type")]
    pub sample_type: Option<&'static str>,
    pub confidence: Option<&'static str>,
    pub matched_pattern: Option<String>,
    pub sub_pattern: Option<String>,
    pub duration: Option<f64>,
    pub destination: Option<PathBuf>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheSummary {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

impl From<CacheStats> for CacheSummary {
    fn from(stats: CacheStats) -> Self {
        Self {
            entries: stats.entries,
            hits: stats.hits,
            misses: stats.misses,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub total: usize,
    pub processed: usize,
    pub skipped_cached: usize,
    pub skipped_existing: usize,
    pub planned: usize,
    pub failed: usize,
    pub low_confidence: usize,
    pub elapsed_secs: f64,
    pub categories: BTreeMap<String, usize>,
    pub destinations: BTreeMap<String, usize>,
    pub errors: Vec<String>,
    pub cache: Option<CacheSummary>,
}

/// Everything a run decided, ready to serialize.
#[derive(Debug, Clone, Serialize)]
pub struct ClassificationReport {
    pub generated_at: String,
    pub source: PathBuf,
    pub output: PathBuf,
    pub dry_run: bool,
    pub summary: ReportSummary,
    pub entries: Vec<ReportEntry>,
}

/// Files written by [`ClassificationReport::write`].
#[derive(Debug, Clone)]
pub struct ReportPaths {
    pub json: PathBuf,
    pub text: PathBuf,
}

impl ClassificationReport {
    pub fn from_run(
        run: &ProcessRun,
        source: &Path,
        output: &Path,
        dry_run: bool,
        cache: Option<CacheStats>,
    ) -> Self {
        let entries: Vec<ReportEntry> = run.files.iter().map(entry_for).collect();

        let mut categories = BTreeMap::new();
        for category in entries.iter().filter_map(|e| e.category.as_ref()) {
            *categories.entry(category.clone()).or_insert(0) += 1;
        }

        let stats = &run.stats;
        Self {
            generated_at: Local::now().to_rfc3339(),
            source: source.to_path_buf(),
            output: output.to_path_buf(),
            dry_run,
            summary: ReportSummary {
                total: stats.total,
                processed: stats.processed,
                skipped_cached: stats.skipped_cached,
                skipped_existing: stats.skipped_existing,
                planned: stats.planned,
                failed: stats.failed,
                low_confidence: stats.low_confidence,
                elapsed_secs: stats.elapsed.as_secs_f64(),
                categories,
                destinations: stats.destinations.clone(),
                errors: stats.errors.to_vec(),
                cache: cache.map(CacheSummary::from),
            },
            entries,
        }
    }

    /// Human-readable summary.
    pub fn to_text(&self) -> String {
        let s = &self.summary;
        let mut lines = vec![
            "=== SAMPLE CLASSIFICATION SUMMARY ===".to_string(),
            String::new(),
            format!("Generated: {}", self.generated_at),
            format!("Source:    {}", self.source.display()),
            format!("Output:    {}", self.output.display()),
        ];
        if self.dry_run {
            lines.push("Mode:      dry run".to_string());
        }
        lines.extend([
            String::new(),
            format!("Total files:        {}", s.total),
            format!("Organized:          {}", s.processed),
            format!("Planned:            {}", s.planned),
            format!("Skipped (cached):   {}", s.skipped_cached),
            format!("Skipped (existing): {}", s.skipped_existing),
            format!("Failed:             {}", s.failed),
            format!("Low confidence:     {}", s.low_confidence),
            format!("Processing time:    {:.2} seconds", s.elapsed_secs),
        ]);

        let classified: usize = s.categories.values().sum();
        if classified > 0 {
            lines.push(String::new());
            lines.push("Category Distribution:".to_string());
            for (category, count) in &s.categories {
                let pct = *count as f64 * 100.0 / classified as f64;
                lines.push(format!("  {}: {} files ({:.1}%)", category, count, pct));
            }
        }

        if !s.destinations.is_empty() {
            lines.push(String::new());
            lines.push("Destinations:".to_string());
            lines.extend(
                s.destinations
                    .iter()
                    .map(|(dest, count)| format!("  {}: {}", dest, count)),
            );
        }

        if let Some(cache) = &s.cache {
            lines.extend([
                String::new(),
                "Cache Performance:".to_string(),
                format!("  entries: {}", cache.entries),
                format!("  hits: {}", cache.hits),
                format!("  misses: {}", cache.misses),
            ]);
        }

        let review: Vec<String> = self
            .entries
            .iter()
            .filter(|e| e.confidence == Some("low"))
            .map(|entry| {
                let dest = entry
                    .destination
                    .as_deref()
                    .map(|d| d.display().to_string())
                    .unwrap_or_default();
                format!("  {} -> {}", entry.file.display(), dest)
            })
            .collect();
        if !review.is_empty() {
            lines.push(String::new());
            lines.push("Needs Review (low confidence):".to_string());
            lines.extend(review);
        }

        if !s.errors.is_empty() {
            lines.push(String::new());
            lines.push("Errors:".to_string());
            lines.extend(s.errors.iter().map(|error| format!("  {}", error)));
        }

        let mut out = lines.join("\n");
        out.push('\n');
        out
    }

    /// Write the JSON and text reports under `<output_root>/reports/`.
    pub fn write(&self, output_root: &Path) -> Result<ReportPaths> {
        let dir = output_root.join(REPORTS_DIR);
        std::fs::create_dir_all(&dir)
            .with_context(format!("Failed to create report directory {:?}", dir))?;

        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        let paths = ReportPaths {
            json: dir.join(format!("classification_report_{}.json", stamp)),
            text: dir.join(format!("classification_summary_{}.txt", stamp)),
        };

        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&paths.json, json)
            .with_context(format!("Failed to write {:?}", paths.json))?;
        std::fs::write(&paths.text, self.to_text())
            .with_context(format!("Failed to write {:?}", paths.text))?;

        tracing::info!(target: "report", json = %paths.json.display(), text = %paths.text.display(), "Reports written");
        Ok(paths)
    }
}

fn entry_for(outcome: &crate::processor::FileOutcome) -> ReportEntry {
    let (status, error) = match &outcome.status {
        FileStatus::Cached => ("cached", None),
        FileStatus::Planned => ("planned", None),
        FileStatus::Transferred(MoveOutcome::Copied(_)) => ("copied", None),
        FileStatus::Transferred(MoveOutcome::Moved(_)) => ("moved", None),
        FileStatus::Transferred(MoveOutcome::Skipped(_)) => ("exists", None),
        FileStatus::Failed(message) => ("failed", Some(message.clone())),
    };

    let result = outcome.classification.as_ref();
    ReportEntry {
        file: outcome.source.clone(),
        status,
        category: result.map(|r| r.category.clone()),
        subcategory: result.and_then(|r| r.subcategory()),
        sample_type: result.map(|r| r.type_label()),
        confidence: result.map(|r| r.confidence.as_str()),
        matched_pattern: result
            .and_then(|r| r.matched_pattern.as_ref())
            .map(|m| m.pattern.clone()),
        sub_pattern: result.and_then(|r| r.sub_pattern.clone()),
        duration: outcome.duration,
        destination: outcome.destination.clone(),
        error,
    }
}
