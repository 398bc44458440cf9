//! Pattern document inspection commands.

use std::path::Path;

use super::load_registry;
use crate::config::Config;
use crate::patterns::PatternRegistry;

/// Validate a pattern document and print a per-category summary
pub fn cmd_check_patterns(settings: &Config, file: Option<&Path>) -> anyhow::Result<()> {
    let registry = load_registry(settings, file)?;
    let source = file
        .or(settings.paths.patterns_file.as_deref())
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "built-in patterns".to_string());

    println!("{}: OK\n", source);
    print!("{}", category_summary(&registry));
    Ok(())
}

/// Print every leaf directory of the taxonomy
pub fn cmd_tree(settings: &Config, patterns: Option<&Path>) -> anyhow::Result<()> {
    let registry = load_registry(settings, patterns)?;
    for path in registry.folder_paths() {
        println!("{}", path.join("/"));
    }
    Ok(())
}

fn category_summary(registry: &PatternRegistry) -> String {
    let mut out = format!("{:<14} {:>8} {:>6} {:>6}\n", "CATEGORY", "PRIORITY", "MAIN", "SUB");
    for name in registry.categories() {
        let priority = registry.priority_of(name).unwrap_or_default();
        let (main, sub) = registry.pattern_counts(name).unwrap_or_default();
        out.push_str(&format!("{:<14} {:>8} {:>6} {:>6}\n", name, priority, main, sub));
    }
    out
}
