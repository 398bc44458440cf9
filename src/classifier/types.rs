//! Classification result types.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::patterns::{DurationVerdict, SampleType, UNKNOWN_CATEGORY};

/// Quality annotation on a result; `Low` marks it for manual review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Low,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Low => "low",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The main pattern that selected the category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedPattern {
    /// Position within the category's main patterns
    pub index: usize,
    pub pattern: String,
}

/// One classification decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub category: String,
    /// Sub-folder segments below the category, without the tag
    pub subcategory_path: Vec<String>,
    pub tag: Option<SampleType>,
    /// Full destination directory segments, never empty
    pub folder_path: Vec<String>,
    pub confidence: Confidence,
    pub matched_pattern: Option<MatchedPattern>,
    /// Winning sub-pattern key, e.g. `KICK/LOOP`
    pub sub_pattern: Option<String>,
    pub duration_verdict: DurationVerdict,
}

impl ClassificationResult {
    /// Subcategory path joined with `/`, if any.
    pub fn subcategory(&self) -> Option<String> {
        if self.subcategory_path.is_empty() {
            None
        } else {
            Some(self.subcategory_path.join("/"))
        }
    }

    /// Destination relative to the output root, joined with `/`.
    pub fn destination(&self) -> String {
        self.folder_path.join("/")
    }

    /// `LOOP`, `ONE SHOT`, or `UNDEFINED` for untyped results.
    pub fn type_label(&self) -> &'static str {
        self.tag.map(|t| t.as_str()).unwrap_or("UNDEFINED")
    }

    pub fn is_unmatched(&self) -> bool {
        self.category == UNKNOWN_CATEGORY
    }
}
