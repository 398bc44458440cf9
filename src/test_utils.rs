//! Test utilities and fixtures for sample-sorter tests.
//!
//! This module provides small pattern documents, shared registries, and
//! helpers for writing throwaway audio files.
//!
//! # Example
//!
//! ```ignore
//! use crate::test_utils::{default_registry, write_wav};
//!
//! let registry = default_registry();
//! let dir = tempfile::tempdir().unwrap();
//! write_wav(&dir.path().join("Kick_01.wav"), 0.5);
//! ```

use std::path::Path;
use std::sync::{Arc, LazyLock};

use crate::patterns::PatternRegistry;

/// A compact pattern document with hand-picked overlaps.
///
/// - `DRUMS` main patterns are `kicks?|bd` and `snares?|claps?`, so token
///   boundaries can be checked against "kick" alone
/// - `INSTRUMENTS` declares three equal-depth sub-patterns that all match
///   `acoustic_chord_loop`
/// - `DRUMS` declares `PERCUSSION` before the deeper `PERCUSSION/TOM`
pub const FIXTURE_PATTERNS_JSON: &str = r#"{
    "base_patterns": {
        "LOOP": "loops?",
        "ONE SHOT": "hits?|one[\\s_-]*shots?"
    },
    "duration_thresholds": {
        "global": {"loop_min_duration": 1.5, "oneshot_max_duration": 1.0},
        "DRUMS": {
            "oneshot_max_duration": 1.0,
            "PERCUSSION": {"oneshot_max_duration": 1.2}
        },
        "INSTRUMENTS": {"oneshot_max_duration": 1.5, "loop_min_duration": 2.0}
    },
    "folder_structure": {
        "VOCALS": ["LOOP", "ONE SHOT"],
        "DRUMS": {
            "KICK": ["LOOP", "ONE SHOT"],
            "SNARE": ["LOOP", "ONE SHOT"],
            "CLAP": ["LOOP", "ONE SHOT"],
            "PERCUSSION": {"TOM": ["LOOP", "ONE SHOT"], "LOOP": [], "ONE SHOT": []},
            "LOOP": [],
            "ONE SHOT": []
        },
        "INSTRUMENTS": {
            "LOOP": {"PADS": []},
            "ONE SHOT": {"ACOUSTIC CHORDS": [], "CHORDS": [], "ACOUSTIC": []}
        },
        "FX": {"AMBIENT": [], "LOOP": [], "ONE SHOT": []}
    },
    "categories": {
        "VOCALS": {
            "mainPatterns": ["vox|vocals?"],
            "subPatterns": {"LOOP": "loops?|phrases?", "ONE SHOT": "hits?|chops?"}
        },
        "DRUMS": {
            "mainPatterns": ["kicks?|bd", "snares?|claps?"],
            "subPatterns": {
                "KICK": "kicks?|bd",
                "KICK/LOOP": "kicks?[\\s_-]*loops?",
                "PERCUSSION": "percs?",
                "PERCUSSION/TOM": "toms?",
                "SNARE": "snares?",
                "CLAP": "claps?"
            }
        },
        "INSTRUMENTS": {
            "mainPatterns": ["pads?|chords?|acoustic"],
            "subPatterns": {
                "ONE SHOT/ACOUSTIC CHORDS": "acoustic[\\s_-]*chords?",
                "ONE SHOT/CHORDS": "chords?",
                "ONE SHOT/ACOUSTIC": "acoustic",
                "LOOP/PADS": "pads?"
            }
        },
        "FX": {
            "mainPatterns": ["fx|ambient"],
            "subPatterns": {"AMBIENT": "ambient"}
        }
    },
    "classification_priority": {
        "VOCALS": 5,
        "DRUMS": 4,
        "INSTRUMENTS": 3,
        "FX": 1,
        "UNKNOWN": 0
    }
}"#;

static DEFAULT_REGISTRY: LazyLock<Arc<PatternRegistry>> = LazyLock::new(|| {
    Arc::new(PatternRegistry::embedded().expect("embedded patterns must compile"))
});

static FIXTURE_REGISTRY: LazyLock<Arc<PatternRegistry>> = LazyLock::new(|| {
    Arc::new(PatternRegistry::from_json(FIXTURE_PATTERNS_JSON).expect("fixture patterns must compile"))
});

/// Registry built from the embedded default document, compiled once per test binary.
pub fn default_registry() -> Arc<PatternRegistry> {
    Arc::clone(&DEFAULT_REGISTRY)
}

/// Registry built from [`FIXTURE_PATTERNS_JSON`].
pub fn fixture_registry() -> Arc<PatternRegistry> {
    Arc::clone(&FIXTURE_REGISTRY)
}

/// Write a silent 16-bit mono PCM WAV of roughly `seconds` length.
pub fn write_wav(path: &Path, seconds: f64) {
    const SAMPLE_RATE: u32 = 44_100;
    const BYTES_PER_SAMPLE: u32 = 2;

    let samples = (seconds * SAMPLE_RATE as f64).round() as u32;
    let data_len = samples * BYTES_PER_SAMPLE;

    let mut bytes = Vec::with_capacity(44 + data_len as usize);
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
    bytes.extend_from_slice(b"WAVE");

    bytes.extend_from_slice(b"fmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes()); // PCM
    bytes.extend_from_slice(&1u16.to_le_bytes()); // mono
    bytes.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
    bytes.extend_from_slice(&(SAMPLE_RATE * BYTES_PER_SAMPLE).to_le_bytes());
    bytes.extend_from_slice(&(BYTES_PER_SAMPLE as u16).to_le_bytes());
    bytes.extend_from_slice(&16u16.to_le_bytes());

    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_len.to_le_bytes());
    bytes.resize(44 + data_len as usize, 0);

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create fixture directory");
    }
    std::fs::write(path, bytes).expect("Failed to write fixture wav");
}

/// Write a small non-audio file, creating parent directories.
pub fn write_file(path: &Path, contents: &[u8]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create fixture directory");
    }
    std::fs::write(path, contents).expect("Failed to write fixture file");
}
