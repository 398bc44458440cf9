//! Tag and verdict types shared by the registry and the classifier.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a sample repeats seamlessly or is a single event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SampleType {
    #[serde(rename = "LOOP")]
    Loop,
    #[serde(rename = "ONE SHOT")]
    OneShot,
}

impl SampleType {
    /// Both tags, loop first (it wins simultaneous base-pattern matches).
    pub const ALL: [SampleType; 2] = [SampleType::Loop, SampleType::OneShot];

    /// Folder / configuration label.
    pub fn as_str(&self) -> &'static str {
        match self {
            SampleType::Loop => "LOOP",
            SampleType::OneShot => "ONE SHOT",
        }
    }

    /// Parse a taxonomy label. Exact match, labels are upper case in config.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == label)
    }
}

impl fmt::Display for SampleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a measured duration says about the sample type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DurationVerdict {
    Loop,
    #[serde(rename = "ONE SHOT")]
    OneShot,
    /// Duration falls in the gap between the two thresholds
    Ambiguous,
    /// No duration available
    Unknown,
}

impl DurationVerdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            DurationVerdict::Loop => "LOOP",
            DurationVerdict::OneShot => "ONE SHOT",
            DurationVerdict::Ambiguous => "AMBIGUOUS",
            DurationVerdict::Unknown => "UNKNOWN",
        }
    }

    /// The tag this verdict commits to, if any.
    pub fn sample_type(&self) -> Option<SampleType> {
        match self {
            DurationVerdict::Loop => Some(SampleType::Loop),
            DurationVerdict::OneShot => Some(SampleType::OneShot),
            DurationVerdict::Ambiguous | DurationVerdict::Unknown => None,
        }
    }
}

impl fmt::Display for DurationVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
