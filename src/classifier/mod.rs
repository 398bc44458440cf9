//! Per-file classification decisions.
//!
//! Given a file name and an optional duration, [`Classifier::classify`]
//! picks a category, a sub-folder path and a LOOP / ONE SHOT tag, in a
//! fixed order:
//!
//! 1. Main patterns select the category; highest priority wins
//! 2. The deepest matching sub-pattern selects the sub-folder path and
//!    possibly a tag
//! 3. Where the taxonomy wants a tag and none came from the file name,
//!    the duration verdict decides, then the base patterns, then ONE SHOT
//! 4. The taxonomy turns the result into a destination path
//!
//! [`Classifier::classify_with_folders`] runs the same steps with the
//! enclosing folder names as fallback text, so `Kicks/001.wav` still lands
//! under DRUMS/KICK.
//!
//! Classification is total. Unmatched names go to `UNKNOWN/UNMATCHED_SAMPLES`.

mod types;

pub use types::{ClassificationResult, Confidence, MatchedPattern};

use std::sync::Arc;

use crate::patterns::{
    DurationVerdict, PatternRegistry, SampleType, UNKNOWN_CATEGORY, sample_stem, split_path_key,
};

/// Stateless classifier over a shared registry.
#[derive(Debug, Clone)]
pub struct Classifier {
    registry: Arc<PatternRegistry>,
}

impl Classifier {
    pub fn new(registry: Arc<PatternRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &PatternRegistry {
        &self.registry
    }

    /// Classify one file name. Directories and the extension are ignored.
    pub fn classify(&self, filename: &str, duration: Option<f64>) -> ClassificationResult {
        self.classify_with_folders(filename, &[], duration)
    }

    /// Classify a file name with the names of the folders it sits in,
    /// outermost first (`["Pack", "Kicks"]` for `Pack/Kicks/001.wav`).
    ///
    /// The file name always speaks first. Folder names, innermost first,
    /// only fill in what the name leaves open: the category, the
    /// sub-folder and the base tag.
    pub fn classify_with_folders(
        &self,
        filename: &str,
        folders: &[String],
        duration: Option<f64>,
    ) -> ClassificationResult {
        let texts: Vec<&str> = std::iter::once(sample_stem(filename))
            .chain(folders.iter().rev().map(String::as_str))
            .collect();
        let registry = &*self.registry;

        let Some((source, top)) = texts.iter().find_map(|text| {
            let hits = registry.match_category(text);
            hits.first().copied().map(|top| (*text, top))
        }) else {
            tracing::debug!(target: "classifier", file = filename, "No category matched");
            return ClassificationResult {
                category: UNKNOWN_CATEGORY.to_string(),
                subcategory_path: Vec::new(),
                tag: None,
                folder_path: registry.folder_path_for(UNKNOWN_CATEGORY, &[], None),
                confidence: Confidence::Low,
                matched_pattern: None,
                sub_pattern: None,
                duration_verdict: registry.duration_verdict(UNKNOWN_CATEGORY, &[], duration),
            };
        };

        let category = top.category;
        let sub_pattern = texts
            .iter()
            .find_map(|text| registry.match_sub_pattern(category, text));
        let (subcategory_path, key_tag) = match sub_pattern {
            Some(key) => split_path_key(key),
            None => (Vec::new(), None),
        };

        let verdict = registry.duration_verdict(category, &subcategory_path, duration);
        let (tag, confidence) = if registry.requires_tag(category, &subcategory_path) {
            let (tag, confidence) = resolve_tag(key_tag, verdict, || {
                texts.iter().find_map(|text| registry.match_base_tag(text))
            });
            (Some(tag), confidence)
        } else {
            (None, Confidence::High)
        };

        let folder_path = registry.folder_path_for(category, &subcategory_path, tag);

        tracing::debug!(
            target: "classifier",
            file = filename,
            category,
            matched_on = source,
            sub_pattern,
            tag = tag.map(|t| t.as_str()),
            verdict = %verdict,
            %confidence,
            "Classified"
        );

        ClassificationResult {
            category: category.to_string(),
            subcategory_path,
            tag,
            folder_path,
            confidence,
            matched_pattern: Some(MatchedPattern {
                index: top.pattern_index,
                pattern: top.pattern.to_string(),
            }),
            sub_pattern: sub_pattern.map(str::to_string),
            duration_verdict: verdict,
        }
    }
}

/// Settle the tag once the taxonomy has asked for one.
///
/// A tag from the file name always stands; a disagreeing duration only
/// lowers confidence.
fn resolve_tag(
    key_tag: Option<SampleType>,
    verdict: DurationVerdict,
    base_tag: impl FnOnce() -> Option<SampleType>,
) -> (SampleType, Confidence) {
    let measured = verdict.sample_type();
    match key_tag {
        Some(tag) => match measured {
            Some(m) if m != tag => (tag, Confidence::Low),
            _ => (tag, Confidence::High),
        },
        None => match measured.or_else(base_tag) {
            Some(tag) => (tag, Confidence::High),
            None => (SampleType::OneShot, Confidence::Low),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{FIXTURE_PATTERNS_JSON, default_registry, fixture_registry};

    fn path(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    // ========================================================================
    // Scenarios on the default document
    // ========================================================================

    #[test]
    fn test_kick_loop_from_file_name() {
        let classifier = Classifier::new(default_registry());
        let result = classifier.classify("Kick_Loop_120bpm.wav", None);

        assert_eq!(result.category, "DRUMS");
        assert_eq!(result.subcategory_path, path(&["KICK"]));
        assert_eq!(result.tag, Some(SampleType::Loop));
        assert_eq!(result.folder_path, path(&["DRUMS", "KICK", "LOOP"]));
        assert_eq!(result.confidence, Confidence::High);
        assert_eq!(result.sub_pattern.as_deref(), Some("KICK/LOOP"));
        assert_eq!(result.duration_verdict, DurationVerdict::Unknown);
    }

    #[test]
    fn test_synth_pad_with_agreeing_duration() {
        let classifier = Classifier::new(default_registry());
        let result = classifier.classify("synth_pad_warm.wav", Some(4.5));

        assert_eq!(result.category, "INSTRUMENTS");
        assert_eq!(result.sub_pattern.as_deref(), Some("LOOP/PADS"));
        assert_eq!(result.duration_verdict, DurationVerdict::Loop);
        assert_eq!(result.folder_path, path(&["INSTRUMENTS", "LOOP", "PADS"]));
        assert_eq!(result.confidence, Confidence::High);
    }

    #[test]
    fn test_unmatched_name_falls_back() {
        let classifier = Classifier::new(default_registry());
        let result = classifier.classify("untitled_07.wav", None);

        assert_eq!(result.category, "UNKNOWN");
        assert_eq!(result.folder_path, path(&["UNKNOWN", "UNMATCHED_SAMPLES"]));
        assert_eq!(result.tag, None);
        assert_eq!(result.matched_pattern, None);
        assert!(result.is_unmatched());
    }

    #[test]
    fn test_percussion_gap_defaults_to_one_shot() {
        let classifier = Classifier::new(default_registry());
        let result = classifier.classify("perc_01.wav", Some(1.35));

        assert_eq!(result.duration_verdict, DurationVerdict::Ambiguous);
        assert_eq!(result.tag, Some(SampleType::OneShot));
        assert_eq!(result.confidence, Confidence::Low);
        assert_eq!(
            result.folder_path,
            path(&["DRUMS", "PERCUSSION", "ONE SHOT"])
        );
    }

    #[test]
    fn test_untyped_folder_needs_no_tag() {
        let classifier = Classifier::new(default_registry());
        let result = classifier.classify("dark_drone_01.wav", Some(12.0));

        assert_eq!(result.category, "FX");
        assert_eq!(result.tag, None);
        assert_eq!(result.folder_path, path(&["FX", "DRONE"]));
        assert_eq!(result.confidence, Confidence::High);
        assert_eq!(result.type_label(), "UNDEFINED");
    }

    #[test]
    fn test_path_and_extension_are_ignored() {
        let classifier = Classifier::new(default_registry());
        let bare = classifier.classify("Kick_Loop_120bpm", None);
        let nested = classifier.classify("packs/House Vol 1/Kick_Loop_120bpm.WAV", None);
        assert_eq!(bare, nested);
    }

    // ========================================================================
    // Tag resolution on the fixture document
    // ========================================================================

    #[test]
    fn test_disagreeing_duration_keeps_name_tag() {
        let classifier = Classifier::new(fixture_registry());
        let result = classifier.classify("kick_loop", Some(0.3));

        assert_eq!(result.tag, Some(SampleType::Loop));
        assert_eq!(result.duration_verdict, DurationVerdict::OneShot);
        assert_eq!(result.confidence, Confidence::Low);
        assert_eq!(result.folder_path, path(&["DRUMS", "KICK", "LOOP"]));
    }

    #[test]
    fn test_duration_decides_without_name_tag() {
        let classifier = Classifier::new(fixture_registry());

        let short = classifier.classify("kick_01", Some(0.4));
        assert_eq!(short.tag, Some(SampleType::OneShot));
        assert_eq!(short.confidence, Confidence::High);

        let long = classifier.classify("kick_01", Some(3.0));
        assert_eq!(long.tag, Some(SampleType::Loop));
        assert_eq!(long.folder_path, path(&["DRUMS", "KICK", "LOOP"]));
    }

    #[test]
    fn test_base_tag_breaks_ambiguous_duration() {
        let classifier = Classifier::new(fixture_registry());
        let result = classifier.classify("kick_hit", Some(1.2));

        assert_eq!(result.duration_verdict, DurationVerdict::Ambiguous);
        assert_eq!(result.tag, Some(SampleType::OneShot));
        assert_eq!(result.confidence, Confidence::High);
    }

    #[test]
    fn test_no_signal_defaults_to_low_one_shot() {
        let classifier = Classifier::new(fixture_registry());
        let result = classifier.classify("kick_01", None);

        assert_eq!(result.tag, Some(SampleType::OneShot));
        assert_eq!(result.confidence, Confidence::Low);
        assert_eq!(result.folder_path, path(&["DRUMS", "KICK", "ONE SHOT"]));
    }

    #[test]
    fn test_highest_priority_category_wins() {
        let classifier = Classifier::new(fixture_registry());
        let result = classifier.classify("vocal_kick_pad", None);
        assert_eq!(result.category, "VOCALS");
        assert_eq!(
            result.matched_pattern,
            Some(MatchedPattern {
                index: 0,
                pattern: "vox|vocals?".into()
            })
        );
    }

    #[test]
    fn test_equal_depth_sub_pattern_declaration_order() {
        let classifier = Classifier::new(fixture_registry());
        let result = classifier.classify("acoustic_chord_loop.wav", None);

        assert_eq!(result.sub_pattern.as_deref(), Some("ONE SHOT/ACOUSTIC CHORDS"));
        assert_eq!(
            result.folder_path,
            path(&["INSTRUMENTS", "ONE SHOT", "ACOUSTIC CHORDS"])
        );
    }

    #[test]
    fn test_declared_unknown_folder_is_ignored() {
        let mut doc: serde_json::Value = serde_json::from_str(FIXTURE_PATTERNS_JSON).unwrap();
        doc["folder_structure"]["UNKNOWN"] = serde_json::json!(["MISC"]);
        let registry = PatternRegistry::from_json(&doc.to_string()).unwrap();

        let result = Classifier::new(Arc::new(registry)).classify("zzz_07.wav", None);
        assert_eq!(result.category, "UNKNOWN");
        assert_eq!(result.folder_path, path(&["UNKNOWN", "UNMATCHED_SAMPLES"]));
    }

    #[test]
    fn test_dot_separates_tokens() {
        let classifier = Classifier::new(fixture_registry());
        let result = classifier.classify("Kick.01.wav", None);

        assert_eq!(result.category, "DRUMS");
        assert_eq!(result.folder_path, path(&["DRUMS", "KICK", "ONE SHOT"]));
    }

    // ========================================================================
    // Folder names as fallback text
    // ========================================================================

    #[test]
    fn test_folder_supplies_category_and_sub_pattern() {
        let classifier = Classifier::new(fixture_registry());
        let result = classifier.classify_with_folders("001.wav", &path(&["Pack", "Kicks"]), None);

        assert_eq!(result.category, "DRUMS");
        assert_eq!(result.sub_pattern.as_deref(), Some("KICK"));
        assert_eq!(result.folder_path, path(&["DRUMS", "KICK", "ONE SHOT"]));
        assert_eq!(result.confidence, Confidence::Low);
    }

    #[test]
    fn test_folder_supplies_base_tag() {
        let classifier = Classifier::new(fixture_registry());
        let result =
            classifier.classify_with_folders("001.wav", &path(&["Pack", "Kicks", "Loops"]), None);

        assert_eq!(result.tag, Some(SampleType::Loop));
        assert_eq!(result.confidence, Confidence::High);
        assert_eq!(result.folder_path, path(&["DRUMS", "KICK", "LOOP"]));
    }

    #[test]
    fn test_file_name_outranks_folders() {
        let classifier = Classifier::new(fixture_registry());
        let result = classifier.classify_with_folders("snare_hit.wav", &path(&["Vocals", "Loops"]), None);

        assert_eq!(result.category, "DRUMS");
        assert_eq!(result.folder_path, path(&["DRUMS", "SNARE", "ONE SHOT"]));
    }

    #[test]
    fn test_no_folders_matches_classify() {
        let classifier = Classifier::new(fixture_registry());
        assert_eq!(
            classifier.classify_with_folders("kick_01.wav", &[], Some(0.4)),
            classifier.classify("kick_01.wav", Some(0.4))
        );
    }

    #[test]
    fn test_resolve_tag_table() {
        let none = || None;
        assert_eq!(
            resolve_tag(Some(SampleType::Loop), DurationVerdict::Unknown, none),
            (SampleType::Loop, Confidence::High)
        );
        assert_eq!(
            resolve_tag(Some(SampleType::Loop), DurationVerdict::Ambiguous, none),
            (SampleType::Loop, Confidence::High)
        );
        assert_eq!(
            resolve_tag(Some(SampleType::OneShot), DurationVerdict::Loop, none),
            (SampleType::OneShot, Confidence::Low)
        );
        assert_eq!(
            resolve_tag(None, DurationVerdict::Unknown, || Some(SampleType::Loop)),
            (SampleType::Loop, Confidence::High)
        );
        assert_eq!(
            resolve_tag(None, DurationVerdict::OneShot, || Some(SampleType::Loop)),
            (SampleType::OneShot, Confidence::High)
        );
    }
}
