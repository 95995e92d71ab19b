//! File flattening: turn one source file into a flat, ordered key -> scalar map
//!
//! Hierarchical YAML keys are joined with `.`; properties files are already flat.

pub mod nested;
pub mod properties;
pub mod yaml;

use crate::domain::{FileFormat, FlatMap, RawFile};
use crate::error::{ConfigError, Result};
use crate::scan::SourceFile;
use crate::utils::decode_text;

pub use nested::{flatten_tree, unflatten};

/// Parse `text` in the given format into a flat mapping.
pub fn flatten_source(text: &str, format: FileFormat) -> std::result::Result<FlatMap, String> {
    match format {
        FileFormat::Properties => properties::parse_properties(text),
        FileFormat::Yaml => yaml::parse_yaml(text),
    }
}

/// Decode and flatten one walked file.
///
/// Returns `Ok(None)` when the file yields no keys; such files never enter the cache.
pub fn load_raw_file(source: &SourceFile) -> Result<Option<RawFile>> {
    let (text, encoding) = decode_text(&source.bytes);
    let properties = flatten_source(&text, source.format).map_err(|reason| {
        ConfigError::MalformedSource { file: source.filename.clone(), reason }
    })?;

    if properties.is_empty() {
        tracing::debug!("Dropping {} ({}): no keys", source.filename, encoding);
        return Ok(None);
    }

    tracing::debug!(
        "Flattened {}/{} ({}): {} keys",
        source.app_dir,
        source.filename,
        encoding,
        properties.len()
    );

    Ok(Some(RawFile { filename: source.filename.clone(), format: source.format, properties }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn source(filename: &str, content: &str) -> SourceFile {
        SourceFile {
            app_dir: "svc".to_string(),
            filename: filename.to_string(),
            format: FileFormat::from_filename(filename).unwrap(),
            bytes: content.as_bytes().to_vec(),
        }
    }

    #[test]
    fn test_yaml_file_is_flattened() {
        let raw = load_raw_file(&source("svc_uat.yml", "server:\n  port: 8080\n"))
            .unwrap()
            .expect("non-empty");
        assert_eq!(raw.filename, "svc_uat.yml");
        assert_eq!(raw.format, FileFormat::Yaml);
        assert_eq!(raw.properties.get("server.port"), Some(&json!(8080)));
    }

    #[test]
    fn test_empty_file_is_dropped() {
        assert!(load_raw_file(&source("svc_uat.properties", "# only a comment\n")).unwrap().is_none());
        assert!(load_raw_file(&source("svc_uat.yaml", "")).unwrap().is_none());
    }

    #[test]
    fn test_malformed_file_reports_filename() {
        let err = load_raw_file(&source("svc_uat.yml", "a: [1, 2\n")).unwrap_err();
        match err {
            ConfigError::MalformedSource { file, .. } => assert_eq!(file, "svc_uat.yml"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
