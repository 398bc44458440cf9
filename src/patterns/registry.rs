//! Compiled, immutable pattern rule set.

use fancy_regex::Regex;
use std::path::Path;

use super::raw::{BoundaryMacros, FolderNode, GLOBAL_THRESHOLDS, OrderedMap, PatternConfig, ThresholdNode};
use super::taxonomy::{FolderWalk, leaf_paths, split_path_key, walk};
use super::thresholds::Thresholds;
use super::types::{DurationVerdict, SampleType};
use super::{ConfigError, UNKNOWN_CATEGORY, UNMATCHED_SAMPLES};

/// A pattern after macro substitution.
#[derive(Debug)]
struct CompiledPattern {
    /// The alternation as written in the document
    source: String,
    regex: Regex,
}

impl CompiledPattern {
    fn compile(macros: &BoundaryMacros, source: &str, scope: String) -> Result<Self, ConfigError> {
        let regex = Regex::new(&macros.expand(source)).map_err(|e| ConfigError::InvalidPattern {
            scope,
            pattern: source.to_string(),
            source: Box::new(e),
        })?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    /// Backtracking limits count as no match.
    fn is_match(&self, text: &str) -> bool {
        match self.regex.is_match(text) {
            Ok(hit) => hit,
            Err(e) => {
                tracing::debug!(target: "patterns", pattern = %self.source, error = %e, "Pattern evaluation failed");
                false
            }
        }
    }
}

#[derive(Debug)]
struct SubPattern {
    key: String,
    /// Segment count of the full key, deeper keys win
    depth: usize,
    pattern: CompiledPattern,
}

#[derive(Debug)]
struct CategoryRules {
    name: String,
    priority: i64,
    main: Vec<CompiledPattern>,
    /// In declaration order; the index doubles as the tie-break ordinal
    subs: Vec<SubPattern>,
}

/// One category whose main patterns matched a file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryMatch<'a> {
    pub category: &'a str,
    pub priority: i64,
    /// Index of the first matching main pattern
    pub pattern_index: usize,
    /// Source text of that pattern
    pub pattern: &'a str,
}

/// Ready-to-query rule set built from a [`PatternConfig`].
///
/// Immutable after construction; share it with `Arc` across threads.
#[derive(Debug)]
pub struct PatternRegistry {
    /// In declaration order
    categories: Vec<CategoryRules>,
    /// LOOP first, it wins simultaneous matches
    base: Vec<(SampleType, CompiledPattern)>,
    thresholds: OrderedMap<ThresholdNode>,
    folders: OrderedMap<FolderNode>,
    priorities: OrderedMap<i64>,
}

impl PatternRegistry {
    /// Validate and compile a pattern document.
    pub fn new(config: PatternConfig) -> Result<Self, ConfigError> {
        let PatternConfig {
            pattern_config: macros,
            base_patterns,
            duration_thresholds,
            folder_structure,
            categories: category_specs,
            classification_priority,
        } = config;

        if folder_structure.is_empty() {
            return Err(ConfigError::EmptyFolderStructure);
        }

        let mut base = Vec::with_capacity(SampleType::ALL.len());
        for tag in SampleType::ALL {
            let source = base_patterns
                .get(tag.as_str())
                .ok_or(ConfigError::MissingBaseTag(tag.as_str()))?;
            let scope = format!("base_patterns[{}]", tag);
            base.push((tag, CompiledPattern::compile(&macros, source, scope)?));
        }

        for category in duration_thresholds.keys() {
            if category != GLOBAL_THRESHOLDS && !classification_priority.contains_key(category) {
                return Err(ConfigError::MissingPriority {
                    category: category.to_string(),
                    section: "duration_thresholds",
                });
            }
        }

        let mut categories = Vec::with_capacity(category_specs.len());
        for (name, spec) in category_specs.iter() {
            let priority = classification_priority.get(name).copied().ok_or_else(|| {
                ConfigError::MissingPriority {
                    category: name.to_string(),
                    section: "categories",
                }
            })?;
            let folder = folder_structure
                .get(name)
                .ok_or_else(|| ConfigError::MissingFolder(name.to_string()))?;

            let main = spec
                .main_patterns
                .iter()
                .enumerate()
                .map(|(i, source)| {
                    CompiledPattern::compile(&macros, source, format!("{}.mainPatterns[{}]", name, i))
                })
                .collect::<Result<Vec<_>, _>>()?;

            let mut subs = Vec::with_capacity(spec.sub_patterns.len());
            for (key, source) in spec.sub_patterns.iter() {
                let (segments, tag) = split_path_key(key);
                let placed = match walk(folder, &segments, tag) {
                    FolderWalk::Resolved(_) => true,
                    FolderWalk::NeedsTag(_) => tag.is_none(),
                    FolderWalk::Unresolved => false,
                };
                if !placed {
                    return Err(ConfigError::UnresolvedSubPattern {
                        category: name.to_string(),
                        key: key.to_string(),
                    });
                }

                let scope = format!("{}.subPatterns[{}]", name, key);
                subs.push(SubPattern {
                    key: key.to_string(),
                    depth: key.split('/').filter(|s| !s.is_empty()).count(),
                    pattern: CompiledPattern::compile(&macros, source, scope)?,
                });
            }

            categories.push(CategoryRules {
                name: name.to_string(),
                priority,
                main,
                subs,
            });
        }

        for (i, a) in categories.iter().enumerate() {
            if let Some(b) = categories[i + 1..].iter().find(|b| b.priority == a.priority) {
                tracing::warn!(
                    target: "patterns",
                    first = %a.name,
                    second = %b.name,
                    priority = a.priority,
                    "Categories share a priority, declaration order decides"
                );
            }
        }

        tracing::info!(
            target: "patterns",
            categories = categories.len(),
            sub_patterns = categories.iter().map(|c| c.subs.len()).sum::<usize>(),
            "Pattern registry compiled"
        );

        Ok(Self {
            categories,
            base,
            thresholds: duration_thresholds,
            folders: folder_structure,
            priorities: classification_priority,
        })
    }

    /// Build from JSON text.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Self::new(PatternConfig::from_json(json)?)
    }

    /// Build from a JSON file on disk.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Self::new(PatternConfig::load(path)?)
    }

    /// Build from the document embedded in the binary.
    pub fn embedded() -> Result<Self, ConfigError> {
        Self::new(PatternConfig::embedded()?)
    }

    /// Every category whose main patterns match `stem`, highest priority
    /// first. Equal priorities keep declaration order.
    pub fn match_category(&self, stem: &str) -> Vec<CategoryMatch<'_>> {
        let mut hits: Vec<CategoryMatch<'_>> = self
            .categories
            .iter()
            .filter_map(|rules| {
                let (index, pattern) = rules
                    .main
                    .iter()
                    .enumerate()
                    .find(|(_, p)| p.is_match(stem))?;
                Some(CategoryMatch {
                    category: &rules.name,
                    priority: rules.priority,
                    pattern_index: index,
                    pattern: &pattern.source,
                })
            })
            .collect();

        // Stable sort keeps declaration order among equal priorities
        hits.sort_by(|a, b| b.priority.cmp(&a.priority));
        hits
    }

    /// The best matching sub-pattern key of `category`.
    ///
    /// Deeper keys win; among equal depth the earliest declared wins.
    pub fn match_sub_pattern(&self, category: &str, stem: &str) -> Option<&str> {
        let rules = self.rules(category)?;
        let mut best: Option<&SubPattern> = None;
        for sub in rules.subs.iter().filter(|s| s.pattern.is_match(stem)) {
            if best.is_none_or(|b| sub.depth > b.depth) {
                best = Some(sub);
            }
        }
        best.map(|s| s.key.as_str())
    }

    /// Category-independent tag from the base patterns. LOOP wins when both match.
    pub fn match_base_tag(&self, stem: &str) -> Option<SampleType> {
        self.base
            .iter()
            .find(|(_, pattern)| pattern.is_match(stem))
            .map(|(tag, _)| *tag)
    }

    /// Thresholds in effect for a category path.
    pub fn thresholds_for(&self, category: &str, subcategory_path: &[String]) -> Thresholds {
        Thresholds::resolve(&self.thresholds, category, subcategory_path)
    }

    pub fn duration_verdict(
        &self,
        category: &str,
        subcategory_path: &[String],
        seconds: Option<f64>,
    ) -> DurationVerdict {
        self.thresholds_for(category, subcategory_path).verdict(seconds)
    }

    /// Output directory segments for a category path and tag.
    ///
    /// Anything the taxonomy cannot place goes to `UNKNOWN/UNMATCHED_SAMPLES`,
    /// whatever the document declares under `UNKNOWN`.
    pub fn folder_path_for(
        &self,
        category: &str,
        subcategory_path: &[String],
        tag: Option<SampleType>,
    ) -> Vec<String> {
        if category == UNKNOWN_CATEGORY {
            return unmatched_path();
        }
        let Some(node) = self.folders.get(category) else {
            return unmatched_path();
        };
        match walk(node, subcategory_path, tag) {
            // Without a tag only a walk that placed every segment is usable
            FolderWalk::Resolved(rest) | FolderWalk::NeedsTag(rest)
                if tag.is_some() || rest.len() == subcategory_path.len() =>
            {
                let mut path = Vec::with_capacity(rest.len() + 1);
                path.push(category.to_string());
                path.extend(rest);
                path
            }
            _ => {
                tracing::debug!(
                    target: "patterns",
                    category,
                    path = %subcategory_path.join("/"),
                    tag = tag.map(|t| t.as_str()),
                    "Taxonomy cannot place path"
                );
                unmatched_path()
            }
        }
    }

    /// Whether the taxonomy still wants a LOOP / ONE SHOT decision below
    /// this category path.
    pub fn requires_tag(&self, category: &str, subcategory_path: &[String]) -> bool {
        self.folders
            .get(category)
            .is_some_and(|node| matches!(walk(node, subcategory_path, None), FolderWalk::NeedsTag(_)))
    }

    /// Every leaf directory of the taxonomy, in declaration order.
    pub fn folder_paths(&self) -> Vec<Vec<String>> {
        let mut out = Vec::new();
        for (name, node) in self.folders.iter() {
            if name == UNKNOWN_CATEGORY {
                continue;
            }
            let mut prefix = vec![name.to_string()];
            leaf_paths(node, &mut prefix, &mut out);
        }
        out
    }

    /// Category names in declaration order.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.name.as_str())
    }

    pub fn priority_of(&self, category: &str) -> Option<i64> {
        self.priorities.get(category).copied()
    }

    /// Main and sub pattern counts of a category.
    pub fn pattern_counts(&self, category: &str) -> Option<(usize, usize)> {
        self.rules(category).map(|r| (r.main.len(), r.subs.len()))
    }

    fn rules(&self, category: &str) -> Option<&CategoryRules> {
        self.categories.iter().find(|c| c.name == category)
    }
}

fn unmatched_path() -> Vec<String> {
    vec![UNKNOWN_CATEGORY.to_string(), UNMATCHED_SAMPLES.to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{FIXTURE_PATTERNS_JSON, default_registry, fixture_registry};

    fn path(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    fn with_change(edit: impl FnOnce(&mut serde_json::Value)) -> Result<PatternRegistry, ConfigError> {
        let mut doc: serde_json::Value = serde_json::from_str(FIXTURE_PATTERNS_JSON).unwrap();
        edit(&mut doc);
        PatternRegistry::from_json(&doc.to_string())
    }

    // ========================================================================
    // Boundary anchoring
    // ========================================================================

    #[test]
    fn test_kick_matches_at_token_boundaries() {
        let registry = fixture_registry();
        for name in ["Kick_01", "KICK", "drum-kick", "drumKick", "kick 2", "808Kick", "Kick.01"] {
            let hits = registry.match_category(name);
            assert!(
                hits.iter().any(|h| h.category == "DRUMS"),
                "{name} should match DRUMS"
            );
        }
    }

    #[test]
    fn test_kick_rejects_embedded_tokens() {
        let registry = fixture_registry();
        for name in ["trickick", "kicking", "Kickstart"] {
            let hits = registry.match_category(name);
            assert!(
                !hits.iter().any(|h| h.category == "DRUMS"),
                "{name} should not match DRUMS"
            );
        }
    }

    #[test]
    fn test_camel_boundary_before_upper_run() {
        let registry = fixture_registry();
        // Lower to upper transition ends the token before "Loop"
        assert!(registry.match_category("bigKickLoop").iter().any(|h| h.category == "DRUMS"));
    }

    // ========================================================================
    // Category and sub-pattern ordering
    // ========================================================================

    #[test]
    fn test_match_category_orders_by_priority() {
        let registry = fixture_registry();
        let hits = registry.match_category("vocal_kick_pad");
        let names: Vec<&str> = hits.iter().map(|h| h.category).collect();
        assert_eq!(names, vec!["VOCALS", "DRUMS", "INSTRUMENTS"]);
        assert!(hits.windows(2).all(|w| w[0].priority >= w[1].priority));
    }

    #[test]
    fn test_match_category_reports_first_matching_pattern() {
        let registry = fixture_registry();
        let hits = registry.match_category("snare_hit");
        assert_eq!(hits[0].category, "DRUMS");
        assert_eq!(hits[0].pattern_index, 1);
        assert_eq!(hits[0].pattern, "snares?|claps?");
    }

    #[test]
    fn test_equal_priority_keeps_declaration_order() {
        let registry = with_change(|doc| {
            doc["classification_priority"]["INSTRUMENTS"] = serde_json::json!(4);
        })
        .unwrap();
        let hits = registry.match_category("kick_pad");
        let names: Vec<&str> = hits.iter().map(|h| h.category).collect();
        assert_eq!(names, vec!["DRUMS", "INSTRUMENTS"]);
    }

    #[test]
    fn test_deepest_sub_pattern_wins() {
        let registry = fixture_registry();
        assert_eq!(
            registry.match_sub_pattern("INSTRUMENTS", "acoustic_chord_loop"),
            Some("ONE SHOT/ACOUSTIC CHORDS")
        );
        // "PERCUSSION" is declared first but "PERCUSSION/TOM" is deeper
        assert_eq!(
            registry.match_sub_pattern("DRUMS", "perc_tom_01"),
            Some("PERCUSSION/TOM")
        );
    }

    #[test]
    fn test_equal_depth_falls_back_to_declaration_order() {
        let registry = fixture_registry();
        assert_eq!(
            registry.match_sub_pattern("INSTRUMENTS", "chord_acoustic"),
            Some("ONE SHOT/CHORDS")
        );
    }

    #[test]
    fn test_no_sub_pattern() {
        let registry = fixture_registry();
        assert_eq!(registry.match_sub_pattern("DRUMS", "drum_thing"), None);
        assert_eq!(registry.match_sub_pattern("NOPE", "kick"), None);
    }

    #[test]
    fn test_base_tag_prefers_loop() {
        let registry = fixture_registry();
        assert_eq!(registry.match_base_tag("loop_hit"), Some(SampleType::Loop));
        assert_eq!(registry.match_base_tag("big_hit"), Some(SampleType::OneShot));
        assert_eq!(registry.match_base_tag("plain"), None);
    }

    // ========================================================================
    // Thresholds and taxonomy
    // ========================================================================

    #[test]
    fn test_percussion_gap_is_ambiguous() {
        let registry = default_registry();
        assert_eq!(
            registry.duration_verdict("DRUMS", &path(&["PERCUSSION"]), Some(1.35)),
            DurationVerdict::Ambiguous
        );
        assert_eq!(
            registry.duration_verdict("DRUMS", &path(&["PERCUSSION"]), None),
            DurationVerdict::Unknown
        );
    }

    #[test]
    fn test_folder_path_for_places_tag() {
        let registry = default_registry();
        assert_eq!(
            registry.folder_path_for("DRUMS", &path(&["KICK"]), Some(SampleType::Loop)),
            path(&["DRUMS", "KICK", "LOOP"])
        );
        assert_eq!(
            registry.folder_path_for("INSTRUMENTS", &path(&["PADS"]), Some(SampleType::Loop)),
            path(&["INSTRUMENTS", "LOOP", "PADS"])
        );
        assert_eq!(
            registry.folder_path_for("FX", &path(&["AMBIENT"]), None),
            path(&["FX", "AMBIENT"])
        );
    }

    #[test]
    fn test_folder_path_for_falls_back_to_unmatched() {
        let registry = default_registry();
        let unmatched = path(&["UNKNOWN", "UNMATCHED_SAMPLES"]);
        assert_eq!(registry.folder_path_for("UNKNOWN", &[], None), unmatched);
        assert_eq!(
            registry.folder_path_for("DRUMS", &path(&["NOT A FOLDER"]), None),
            unmatched
        );
        // INSTRUMENTS has no ONE SHOT/PADS
        assert_eq!(
            registry.folder_path_for("INSTRUMENTS", &path(&["PADS"]), Some(SampleType::OneShot)),
            unmatched
        );
    }

    #[test]
    fn test_declared_unknown_folder_keeps_unmatched_path() {
        let registry = with_change(|doc| {
            doc["folder_structure"]["UNKNOWN"] = serde_json::json!([]);
        })
        .unwrap();

        assert_eq!(
            registry.folder_path_for("UNKNOWN", &[], None),
            path(&["UNKNOWN", "UNMATCHED_SAMPLES"])
        );
        assert!(registry.folder_paths().iter().all(|p| p[0] != "UNKNOWN"));
    }

    #[test]
    fn test_requires_tag() {
        let registry = default_registry();
        assert!(registry.requires_tag("VOCALS", &[]));
        assert!(registry.requires_tag("DRUMS", &path(&["KICK"])));
        assert!(registry.requires_tag("FX", &[]));
        assert!(!registry.requires_tag("FX", &path(&["AMBIENT"])));
        assert!(!registry.requires_tag("UNKNOWN", &[]));
    }

    #[test]
    fn test_folder_paths_cover_taxonomy() {
        let registry = default_registry();
        let paths = registry.folder_paths();
        assert!(paths.contains(&path(&["DRUMS", "KICK", "LOOP"])));
        assert!(paths.contains(&path(&["DRUMS", "PERCUSSION", "TOM", "ONE SHOT"])));
        assert!(paths.contains(&path(&["INSTRUMENTS", "ONE SHOT", "PLUCKS"])));
        assert!(paths.contains(&path(&["FX", "AMBIENT"])));
        assert!(paths.iter().all(|p| p.len() >= 2));
    }

    #[test]
    fn test_accessors() {
        let registry = default_registry();
        let names: Vec<&str> = registry.categories().collect();
        assert_eq!(names, vec!["VOCALS", "DRUMS", "INSTRUMENTS", "BASS", "FX"]);
        assert_eq!(registry.priority_of("UNKNOWN"), Some(0));
        assert_eq!(registry.pattern_counts("VOCALS"), Some((1, 2)));
        assert_eq!(registry.pattern_counts("NOPE"), None);
    }

    // ========================================================================
    // Construction errors
    // ========================================================================

    #[test]
    fn test_bad_regex_is_config_error() {
        let err = with_change(|doc| {
            doc["categories"]["FX"]["mainPatterns"][0] = serde_json::json!("fx(");
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { ref scope, .. } if scope == "FX.mainPatterns[0]"));
    }

    #[test]
    fn test_category_without_priority_is_config_error() {
        let err = with_change(|doc| {
            doc["classification_priority"].as_object_mut().unwrap().remove("FX");
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingPriority { section: "categories", .. }));
    }

    #[test]
    fn test_threshold_without_priority_is_config_error() {
        let err = with_change(|doc| {
            doc["duration_thresholds"]["GHOST"] = serde_json::json!({"loop_min_duration": 1.0});
        })
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingPriority { ref category, section: "duration_thresholds" } if category == "GHOST"
        ));
    }

    #[test]
    fn test_empty_folder_structure_is_config_error() {
        let err = with_change(|doc| {
            doc["folder_structure"] = serde_json::json!({});
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::EmptyFolderStructure));
    }

    #[test]
    fn test_missing_folder_is_config_error() {
        let err = with_change(|doc| {
            doc["folder_structure"].as_object_mut().unwrap().remove("FX");
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingFolder(ref c) if c == "FX"));
    }

    #[test]
    fn test_missing_base_tag_is_config_error() {
        let err = with_change(|doc| {
            doc["base_patterns"].as_object_mut().unwrap().remove("ONE SHOT");
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingBaseTag("ONE SHOT")));
    }

    #[test]
    fn test_unplaceable_sub_pattern_is_config_error() {
        let err = with_change(|doc| {
            doc["categories"]["FX"]["subPatterns"]["AMBIENT/LOOP"] = serde_json::json!("ambient");
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::UnresolvedSubPattern { ref key, .. } if key == "AMBIENT/LOOP"));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = PatternRegistry::from_json("{not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_from_file_missing_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = PatternRegistry::from_file(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read(..)));
    }

    #[test]
    fn test_registry_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PatternRegistry>();
    }
}
