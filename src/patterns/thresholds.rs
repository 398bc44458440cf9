//! Duration threshold lookup.

use super::raw::{GLOBAL_THRESHOLDS, OrderedMap, ThresholdNode};
use super::types::DurationVerdict;

/// Thresholds in effect for one category path.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Thresholds {
    pub loop_min: Option<f64>,
    pub oneshot_max: Option<f64>,
}

impl Thresholds {
    /// Resolve both thresholds for `category` / `subcategory_path`.
    ///
    /// Each kind is taken from the deepest node on the path that defines it,
    /// falling back to the `global` node.
    pub fn resolve(
        tree: &OrderedMap<ThresholdNode>,
        category: &str,
        subcategory_path: &[String],
    ) -> Self {
        let mut chain: Vec<&ThresholdNode> = Vec::with_capacity(subcategory_path.len() + 1);
        if let Some(mut node) = tree.get(category) {
            chain.push(node);
            for segment in subcategory_path {
                match node.children.get(segment) {
                    Some(child) => {
                        chain.push(child);
                        node = child;
                    }
                    None => break,
                }
            }
        }
        let global = tree.get(GLOBAL_THRESHOLDS);

        // Leaf back up to the category, then global
        let pick = |get: fn(&ThresholdNode) -> Option<f64>| {
            chain
                .iter()
                .rev()
                .copied()
                .chain(global)
                .find_map(get)
        };

        Self {
            loop_min: pick(|n| n.loop_min_duration),
            oneshot_max: pick(|n| n.oneshot_max_duration),
        }
    }

    /// Judge a duration against these thresholds.
    pub fn verdict(&self, seconds: Option<f64>) -> DurationVerdict {
        let Some(d) = seconds else {
            return DurationVerdict::Unknown;
        };
        if let Some(max) = self.oneshot_max
            && d <= max
        {
            return DurationVerdict::OneShot;
        }
        if let Some(min) = self.loop_min
            && d >= min
        {
            return DurationVerdict::Loop;
        }
        DurationVerdict::Ambiguous
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> OrderedMap<ThresholdNode> {
        serde_json::from_str(
            r#"{
                "global": {"loop_min_duration": 1.5, "oneshot_max_duration": 1.0},
                "DRUMS": {
                    "oneshot_max_duration": 1.0,
                    "PERCUSSION": {
                        "oneshot_max_duration": 1.2,
                        "SHAKER": {"oneshot_max_duration": 0.8}
                    }
                },
                "INSTRUMENTS": {
                    "oneshot_max_duration": 1.5,
                    "loop_min_duration": 2.0,
                    "CHORDS": {"loop_min_duration": 2.5}
                }
            }"#,
        )
        .unwrap()
    }

    fn path(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_deepest_value_wins_per_kind() {
        let t = Thresholds::resolve(&tree(), "INSTRUMENTS", &path(&["CHORDS"]));
        assert_eq!(t.loop_min, Some(2.5));
        assert_eq!(t.oneshot_max, Some(1.5));
    }

    #[test]
    fn test_missing_kind_falls_back_to_global() {
        let t = Thresholds::resolve(&tree(), "DRUMS", &path(&["PERCUSSION"]));
        assert_eq!(t.oneshot_max, Some(1.2));
        assert_eq!(t.loop_min, Some(1.5));
    }

    #[test]
    fn test_gap_is_ambiguous() {
        let t = Thresholds::resolve(&tree(), "DRUMS", &path(&["PERCUSSION"]));
        assert_eq!(t.verdict(Some(1.35)), DurationVerdict::Ambiguous);
        assert_eq!(t.verdict(Some(1.2)), DurationVerdict::OneShot);
        assert_eq!(t.verdict(Some(1.5)), DurationVerdict::Loop);
    }

    #[test]
    fn test_unknown_segment_stops_walk() {
        let t = Thresholds::resolve(&tree(), "DRUMS", &path(&["KICK", "SHAKER"]));
        assert_eq!(t.oneshot_max, Some(1.0));
    }

    #[test]
    fn test_unknown_category_uses_global() {
        let t = Thresholds::resolve(&tree(), "FX", &[]);
        assert_eq!(t.loop_min, Some(1.5));
        assert_eq!(t.oneshot_max, Some(1.0));
    }

    #[test]
    fn test_no_duration_is_unknown() {
        let t = Thresholds::resolve(&tree(), "DRUMS", &[]);
        assert_eq!(t.verdict(None), DurationVerdict::Unknown);
    }

    #[test]
    fn test_missing_threshold_never_matches() {
        let t = Thresholds {
            loop_min: None,
            oneshot_max: Some(1.0),
        };
        assert_eq!(t.verdict(Some(60.0)), DurationVerdict::Ambiguous);
        assert_eq!(Thresholds::default().verdict(Some(0.1)), DurationVerdict::Ambiguous);
    }
}
