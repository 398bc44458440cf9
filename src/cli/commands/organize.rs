//! Sample folder organization command.

use anyhow::Context;
use clap::Args;
use std::path::PathBuf;

use super::load_registry;
use crate::analyzer::NoDuration;
use crate::classifier::Classifier;
use crate::config::Config;
use crate::organizer::TransferMode;
use crate::processor::{FileStatus, ProcessRun, Processor};
use crate::report::ClassificationReport;

/// Flags of `organize`; anything unset comes from the settings file.
#[derive(Args, Debug, Clone, Default)]
pub struct OrganizeArgs {
    /// Folder containing the samples
    #[arg(short, long)]
    pub source: Option<PathBuf>,
    /// Root of the organized taxonomy
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Pattern document
    #[arg(short, long)]
    pub patterns: Option<PathBuf>,
    /// Move files instead of copying them
    #[arg(long = "move")]
    pub r#move: bool,
    /// Show what would be done without touching any file
    #[arg(long)]
    pub dry_run: bool,
    /// Worker threads (0 = one per core)
    #[arg(short, long)]
    pub threads: Option<usize>,
    /// Process every file even if unchanged since the last run
    #[arg(long)]
    pub no_cache: bool,
    /// Classify by file name only
    #[arg(long)]
    pub no_duration: bool,
    /// Ignore the names of enclosing folders
    #[arg(long)]
    pub no_folder_names: bool,
    /// Replace files already present in the output
    #[arg(long)]
    pub overwrite: bool,
}

impl OrganizeArgs {
    /// Settings with these flags applied on top.
    pub fn apply_to(&self, settings: &Config) -> Config {
        let mut config = settings.clone();
        if let Some(source) = &self.source {
            config.paths.source_path = source.clone();
        }
        if let Some(output) = &self.output {
            config.paths.output_path = output.clone();
        }
        if let Some(patterns) = &self.patterns {
            config.paths.patterns_file = Some(patterns.clone());
        }
        if let Some(threads) = self.threads {
            config.processing.threads = threads;
        }
        config.processing.move_files |= self.r#move;
        config.processing.overwrite_existing |= self.overwrite;
        if self.no_cache {
            config.cache.enabled = false;
        }
        if self.no_duration {
            config.processing.enable_duration_analysis = false;
        }
        if self.no_folder_names {
            config.processing.use_folder_names = false;
        }
        config
    }
}

/// Organize a sample folder into the taxonomy
pub fn cmd_organize(settings: &Config, args: &OrganizeArgs) -> anyhow::Result<()> {
    let config = args.apply_to(settings);
    let classifier = Classifier::new(load_registry(&config, None)?);

    let mut options = config.process_options();
    options.dry_run = args.dry_run;

    println!("Source: {}", options.source.display());
    println!("Output: {}", options.output.display());
    if options.dry_run {
        println!("\n[DRY RUN MODE - No files will be copied or moved]\n");
    }

    let mut processor = Processor::new(classifier, options);
    if !config.processing.enable_duration_analysis {
        processor = processor.with_probe(NoDuration);
    }
    if !args.dry_run
        && let Some(cache) = config.open_cache()
    {
        processor = processor.with_cache(cache);
    }

    let run = processor
        .run()
        .with_context(|| format!("Failed to organize {}", config.paths.source_path.display()))?;

    print_run(&run, processor.options().mode);

    if config.processing.generate_report && !args.dry_run {
        let report = ClassificationReport::from_run(
            &run,
            &config.paths.source_path,
            &config.paths.output_path,
            false,
            processor.cache().map(|c| c.stats()),
        );
        let paths = report
            .write(&config.paths.output_path)
            .context("Failed to write report")?;
        println!("\nReport: {}", paths.json.display());
        println!("Summary: {}", paths.text.display());
    }

    Ok(())
}

fn print_run(run: &ProcessRun, mode: TransferMode) {
    for file in &run.files {
        let dest = file
            .destination
            .as_deref()
            .map(|d| d.display().to_string())
            .unwrap_or_default();
        match &file.status {
            FileStatus::Planned => {
                let verb = match mode {
                    TransferMode::Copy => "WOULD COPY",
                    TransferMode::Move => "WOULD MOVE",
                };
                println!("{}: {} -> {}", verb, file.source.display(), dest);
            }
            FileStatus::Failed(e) => eprintln!("ERROR organizing {}: {}", file.source.display(), e),
            _ => {}
        }
    }

    let stats = &run.stats;
    println!(
        "\nCompleted in {:.1}s: {} organized, {} planned, {} unchanged, {} already present, {} errors",
        stats.elapsed.as_secs_f64(),
        stats.processed,
        stats.planned,
        stats.skipped_cached,
        stats.skipped_existing,
        stats.failed
    );
    if stats.low_confidence > 0 {
        println!("{} files need review (low confidence)", stats.low_confidence);
    }
}
