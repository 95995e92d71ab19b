//! Precedence-based merging of cached files
//!
//! For an (application, profile) pair the applicable files are, lowest to highest:
//!
//! 1. `application_default`
//! 2. `application_{profile}` (skipped for the default profile)
//! 3. `{application}_default`
//! 4. `{application}_{profile}` (skipped for the default profile)
//!
//! Each slot picks the first of `.properties`, `.yml`, `.yaml` present in the cache.

use crate::domain::{
    FileCache, FlatMap, FlatSources, MergedConfig, RawFile, SourceTaggedValue, EXTENSION_ORDER,
};
use crate::error::{ConfigError, Result};
use crate::resolve::PlaceholderResolver;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};

pub const DEFAULT_PROFILE: &str = "default";

/// Application name of the global files every application inherits from.
pub const GLOBAL_APPLICATION: &str = "application";

/// Base names (no extension) of the precedence slots, lowest first.
pub fn precedence_slots(app: &str, profile: &str) -> Vec<String> {
    let mut slots = Vec::with_capacity(4);
    slots.push(format!("{GLOBAL_APPLICATION}_{DEFAULT_PROFILE}"));
    if profile != DEFAULT_PROFILE {
        slots.push(format!("{GLOBAL_APPLICATION}_{profile}"));
    }
    slots.push(format!("{app}_{DEFAULT_PROFILE}"));
    if profile != DEFAULT_PROFILE {
        slots.push(format!("{app}_{profile}"));
    }
    slots
}

/// First cached file named `{base}.{ext}` in extension order.
pub fn find_file<'a>(files: &'a FileCache, base: &str) -> Option<&'a RawFile> {
    EXTENSION_ORDER.iter().find_map(|ext| files.get(&format!("{base}.{ext}")))
}

/// Cached files that apply to (app, profile), lowest precedence first.
///
/// A slot whose base name repeats an earlier one (e.g. app `application`) is used once.
pub fn applicable_files<'a>(files: &'a FileCache, app: &str, profile: &str) -> Vec<&'a RawFile> {
    let mut seen = BTreeSet::new();
    precedence_slots(app, profile)
        .into_iter()
        .filter(|slot| seen.insert(slot.clone()))
        .filter_map(|slot| find_file(files, &slot))
        .collect()
}

/// Merge the applicable files and resolve placeholders.
///
/// Fails with `NotFound` when no file applies.
pub fn merge(
    files: &FileCache,
    app: &str,
    profile: &str,
    resolver: &PlaceholderResolver<'_>,
) -> Result<MergedConfig> {
    let applicable = applicable_files(files, app, profile);
    if applicable.is_empty() {
        return Err(ConfigError::not_found(app, profile));
    }

    let mut raw = FlatMap::new();
    let mut sources: HashMap<&str, &str> = HashMap::new();
    for file in &applicable {
        for (key, value) in &file.properties {
            raw.insert(key.clone(), value.clone());
            sources.insert(key.as_str(), file.filename.as_str());
        }
    }

    let resolved = resolver.resolve_map(&raw)?;

    let mut merged = MergedConfig::new();
    for (key, value) in resolved {
        let source = sources.get(key.as_str()).copied().unwrap_or("unknown").to_string();
        merged.insert(key, SourceTaggedValue { value, source });
    }
    Ok(merged)
}

/// Per-key provenance for (app, profile) without merging values.
///
/// A key keeps the position where it was first seen; its filename is the last writer.
pub fn sources_for(files: &FileCache, app: &str, profile: &str) -> FlatSources {
    let mut sources = FlatSources::new();
    for file in applicable_files(files, app, profile) {
        for key in file.properties.keys() {
            sources.insert(key.clone(), Value::String(file.filename.clone()));
        }
    }
    sources
}

/// Split `svc_name_uat.yml` into (`svc_name`, `uat`).
///
/// Returns `None` for names without an `_` before the extension, or with an empty
/// application or profile part (`svc_.yml`, `_uat.yml`).
pub fn split_app_profile(filename: &str) -> Option<(String, String)> {
    let stem = match filename.rsplit_once('.') {
        Some((stem, _)) => stem,
        None => filename,
    };
    let (app, profile) = stem.rsplit_once('_')?;
    if app.is_empty() || profile.is_empty() {
        return None;
    }
    Some((app.to_string(), profile.to_string()))
}

/// Every distinct (app, profile) observable from cached filenames, sorted.
pub fn discover_pairs(files: &FileCache) -> BTreeSet<(String, String)> {
    files.keys().filter_map(|name| split_app_profile(name)).collect()
}
