//! Classification of bare file names.

use serde::Serialize;
use std::path::Path;

use super::load_registry;
use crate::classifier::{ClassificationResult, Classifier};
use crate::config::Config;
use crate::processor::folder_names;

#[derive(Serialize)]
struct NamedResult<'a> {
    file: &'a str,
    duration: Option<f64>,
    #[serde(flatten)]
    result: ClassificationResult,
}

/// Classify file names and print where each would go
pub fn cmd_classify(
    settings: &Config,
    names: &[String],
    duration: Option<f64>,
    patterns: Option<&Path>,
    json: bool,
) -> anyhow::Result<()> {
    let classifier = Classifier::new(load_registry(settings, patterns)?);

    let results: Vec<NamedResult<'_>> = names
        .iter()
        .map(|name| NamedResult {
            file: name,
            duration,
            result: classify_name(&classifier, name, duration),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    for named in &results {
        println!("{}", describe(named.file, &named.result));
    }
    Ok(())
}

/// Directories in a name count as folder context, as during `organize`.
fn classify_name(classifier: &Classifier, name: &str, duration: Option<f64>) -> ClassificationResult {
    let folders = Path::new(name)
        .parent()
        .map(folder_names)
        .unwrap_or_default();
    classifier.classify_with_folders(name, &folders, duration)
}

fn describe(name: &str, result: &ClassificationResult) -> String {
    let mut line = format!(
        "{} -> {} [{}, {}]",
        name,
        result.destination(),
        result.type_label(),
        result.confidence
    );
    if let Some(m) = &result.matched_pattern {
        line.push_str(&format!("\n    pattern: {}", m.pattern));
    }
    if let Some(sub) = &result.sub_pattern {
        line.push_str(&format!("\n    sub-pattern: {}", sub));
    }
    line
}
