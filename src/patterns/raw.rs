//! Raw pattern configuration as read from `patterns.json`.
//!
//! These types mirror the JSON document one-to-one. Declaration order is
//! part of the tie-break contract, so every mapping is read into an
//! [`OrderedMap`] that keeps the document order instead of a hash map.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::marker::PhantomData;
use std::path::Path;

use super::ConfigError;

/// Pattern document shipped with the binary.
pub const DEFAULT_PATTERNS_JSON: &str = include_str!("default_patterns.json");

/// Key of the threshold node holding process-wide defaults.
pub const GLOBAL_THRESHOLDS: &str = "global";

/// A string-keyed map that remembers insertion order.
///
/// Re-inserting an existing key replaces the value but keeps the position
/// of the first declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedMap<V> {
    entries: Vec<(String, V)>,
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<V> OrderedMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V> FromIterator<(String, V)> for OrderedMap<V> {
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedVisitor<V> {
            type Value = OrderedMap<V>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map with string keys")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut map = OrderedMap::new();
                while let Some((key, value)) = access.next_entry::<String, V>()? {
                    map.insert(key, value);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(OrderedVisitor(PhantomData))
    }
}

/// Text fragments wrapped around every pattern before compilation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundaryMacros {
    /// Word-start anchor
    pub wb: String,
    /// Word-end anchor
    pub we: String,
    /// Inline flag applied to the pattern body only
    pub case_insensitive: String,
}

impl Default for BoundaryMacros {
    fn default() -> Self {
        Self {
            wb: r"(?:^|[_\s.-]|(?<=[a-z])(?=[A-Z])|(?<=[0-9])(?=[a-zA-Z])|(?<=[a-zA-Z])(?=[0-9]))"
                .to_string(),
            we: r"(?:[_\s.-]|(?<=[a-z])(?=[A-Z])|(?<=[A-Z])(?=[a-z])|(?<=[0-9])(?=[a-zA-Z])|(?<=[a-zA-Z])(?=[0-9])|$)"
                .to_string(),
            case_insensitive: "(?i)".to_string(),
        }
    }
}

impl BoundaryMacros {
    /// Substitute the macros around a raw alternation.
    ///
    /// The case-insensitive flag sits inside the body group so it does not
    /// leak into the boundary lookarounds; camel transitions are judged on
    /// the original casing.
    pub fn expand(&self, pattern: &str) -> String {
        format!(
            "{}(?:{}(?:{})){}",
            self.wb, self.case_insensitive, pattern, self.we
        )
    }
}

/// Main and sub patterns of one category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategorySpec {
    #[serde(rename = "mainPatterns", default)]
    pub main_patterns: Vec<String>,
    #[serde(rename = "subPatterns", default)]
    pub sub_patterns: OrderedMap<String>,
}

/// One node of the duration threshold tree.
///
/// In JSON the two threshold keys sit next to the child nodes:
///
/// ```json
/// "DRUMS": { "oneshot_max_duration": 1.0, "PERCUSSION": { "oneshot_max_duration": 1.2 } }
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThresholdNode {
    pub loop_min_duration: Option<f64>,
    pub oneshot_max_duration: Option<f64>,
    pub children: OrderedMap<ThresholdNode>,
}

const LOOP_MIN_KEY: &str = "loop_min_duration";
const ONESHOT_MAX_KEY: &str = "oneshot_max_duration";

impl Serialize for ThresholdNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if let Some(v) = self.loop_min_duration {
            map.serialize_entry(LOOP_MIN_KEY, &v)?;
        }
        if let Some(v) = self.oneshot_max_duration {
            map.serialize_entry(ONESHOT_MAX_KEY, &v)?;
        }
        for (k, child) in self.children.iter() {
            map.serialize_entry(k, child)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ThresholdNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct NodeVisitor;

        impl<'de> Visitor<'de> for NodeVisitor {
            type Value = ThresholdNode;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a threshold node")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut node = ThresholdNode::default();
                while let Some(key) = access.next_key::<String>()? {
                    match key.as_str() {
                        LOOP_MIN_KEY => node.loop_min_duration = Some(access.next_value()?),
                        ONESHOT_MAX_KEY => node.oneshot_max_duration = Some(access.next_value()?),
                        _ => {
                            let child: ThresholdNode = access.next_value()?;
                            node.children.insert(key, child);
                        }
                    }
                }
                Ok(node)
            }
        }

        deserializer.deserialize_map(NodeVisitor)
    }
}

/// A branch of the output taxonomy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FolderNode {
    /// Ordered leaf tags such as `["LOOP", "ONE SHOT"]`; empty means untyped
    Tags(Vec<String>),
    /// Named sub-folders
    Branch(OrderedMap<FolderNode>),
}

/// The complete pattern document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternConfig {
    #[serde(default)]
    pub pattern_config: BoundaryMacros,
    pub base_patterns: OrderedMap<String>,
    #[serde(default)]
    pub duration_thresholds: OrderedMap<ThresholdNode>,
    #[serde(default)]
    pub folder_structure: OrderedMap<FolderNode>,
    pub categories: OrderedMap<CategorySpec>,
    #[serde(default)]
    pub classification_priority: OrderedMap<i64>,
}

impl PatternConfig {
    /// Parse a pattern document from JSON text.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(ConfigError::Parse)
    }

    /// Read and parse a pattern document from disk.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        Self::from_json(&json)
    }

    /// The pattern document embedded in the binary.
    pub fn embedded() -> Result<Self, ConfigError> {
        Self::from_json(DEFAULT_PATTERNS_JSON)
    }
}
