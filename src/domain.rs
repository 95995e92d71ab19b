//! Core data model shared by the flattener, merge engine, caches and comparisons.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::collections::HashMap;

/// Flat, insertion-ordered `key -> scalar` mapping.
pub type FlatMap = serde_json::Map<String, Value>;

/// Insertion-ordered `key -> filename` provenance (values are JSON strings).
pub type FlatSources = serde_json::Map<String, Value>;

/// Per-file cache: filename -> parsed file.
pub type FileCache = HashMap<String, RawFile>;

/// Merged cache: `"app:profile"` -> merged configuration.
pub type MergedCache = HashMap<String, MergedConfig>;

/// Extensions tried, in order, when looking up a file for a precedence slot.
pub const EXTENSION_ORDER: [&str; 3] = ["properties", "yml", "yaml"];

/// Rendered in place of a value or source that is absent on one side of a diff.
pub const NOT_FOUND: &str = "NOT_FOUND";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Properties,
    Yaml,
}

impl FileFormat {
    /// Detect the format from a filename's extension (case-insensitive).
    pub fn from_filename(filename: &str) -> Option<Self> {
        let (_, ext) = filename.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "properties" => Some(Self::Properties),
            "yml" | "yaml" => Some(Self::Yaml),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Properties => "properties",
            Self::Yaml => "yaml",
        }
    }
}

/// One source file after flattening. Never empty once it is in the cache.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawFile {
    pub filename: String,
    pub format: FileFormat,
    pub properties: FlatMap,
}

/// A merged value together with the filename that supplied it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceTaggedValue {
    pub value: Value,
    pub source: String,
}

/// Merged configuration for one (application, profile) pair.
///
/// Keys keep the order in which the merge first saw them; each key remembers the
/// last file in precedence order that wrote it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedConfig {
    values: FlatMap,
    sources: HashMap<String, String>,
}

impl MergedConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, tagged: SourceTaggedValue) {
        let key = key.into();
        self.sources.insert(key.clone(), tagged.source);
        self.values.insert(key, tagged.value);
    }

    pub fn get(&self, key: &str) -> Option<SourceTaggedValue> {
        let value = self.values.get(key)?;
        let source = self.sources.get(key)?;
        Some(SourceTaggedValue { value: value.clone(), source: source.clone() })
    }

    pub fn value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn source(&self, key: &str) -> Option<&str> {
        self.sources.get(key).map(String::as_str)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.values.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value, &str)> {
        self.values.iter().map(|(key, value)| {
            let source = self.sources.get(key).map(String::as_str).unwrap_or("unknown");
            (key, value, source)
        })
    }

    /// Plain values with provenance stripped.
    pub fn to_flat(&self) -> FlatMap {
        self.values.clone()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Serialize for MergedConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value, source) in self.iter() {
            map.serialize_entry(
                key,
                &SourceTaggedValue { value: value.clone(), source: source.to_string() },
            )?;
        }
        map.end()
    }
}

/// Non-merged view of one applicable file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigSource {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub format: FileFormat,
    pub properties: FlatMap,
}

impl ConfigSource {
    pub const CACHED_PATH: &'static str = "<cached>";

    pub fn from_raw(raw: &RawFile) -> Self {
        Self {
            name: raw.filename.clone(),
            path: Self::CACHED_PATH.to_string(),
            format: raw.format,
            properties: raw.properties.clone(),
        }
    }
}

/// Cache key for a merged configuration.
pub fn cache_key(app: &str, profile: &str) -> String {
    format!("{app}:{profile}")
}

/// Render a scalar the way it is compared and printed: strings verbatim,
/// everything else as its JSON text (`null`, `8080`, `true`).
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn format_detection_is_case_insensitive() {
        assert_eq!(FileFormat::from_filename("svc_uat.PROPERTIES"), Some(FileFormat::Properties));
        assert_eq!(FileFormat::from_filename("svc_uat.yml"), Some(FileFormat::Yaml));
        assert_eq!(FileFormat::from_filename("svc_uat.Yaml"), Some(FileFormat::Yaml));
        assert_eq!(FileFormat::from_filename("svc_uat.json"), None);
        assert_eq!(FileFormat::from_filename("README"), None);
    }

    #[test]
    fn merged_config_overwrites_source_but_keeps_position() {
        let mut merged = MergedConfig::new();
        merged.insert("a", SourceTaggedValue { value: json!("1"), source: "x_default.yml".into() });
        merged.insert("b", SourceTaggedValue { value: json!("2"), source: "x_default.yml".into() });
        merged.insert("a", SourceTaggedValue { value: json!("3"), source: "x_uat.yml".into() });

        let keys: Vec<&String> = merged.keys().collect();
        assert_eq!(keys, ["a", "b"]);
        assert_eq!(merged.source("a"), Some("x_uat.yml"));
        assert_eq!(merged.value("a"), Some(&json!("3")));
    }

    #[test]
    fn merged_config_serializes_value_and_source() {
        let mut merged = MergedConfig::new();
        merged.insert("port", SourceTaggedValue { value: json!(8080), source: "svc_uat.yml".into() });
        let encoded = serde_json::to_value(&merged).unwrap();
        assert_eq!(encoded, json!({"port": {"value": 8080, "source": "svc_uat.yml"}}));
    }

    #[test]
    fn value_text_renders_scalars() {
        assert_eq!(value_text(&json!("abc")), "abc");
        assert_eq!(value_text(&json!(8080)), "8080");
        assert_eq!(value_text(&json!(true)), "true");
        assert_eq!(value_text(&Value::Null), "null");
    }
}
