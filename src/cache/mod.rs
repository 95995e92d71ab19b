//! Two-level cache: per-file flattened content and per-(app, profile) merges
//!
//! A rebuild assembles a complete generation off-lock and swaps it in under the
//! write lock, so readers see either the previous generation or the new one.
//! Every read returns owned copies.

use crate::domain::{cache_key, FileCache, MergedCache, MergedConfig, RawFile};
use crate::merge;
use crate::resolve::PlaceholderResolver;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, MutexGuard, RwLock};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Debug, Default)]
struct Generation {
    files: FileCache,
    merged: MergedCache,
    /// `"app:profile"` -> why its merge failed.
    failures: HashMap<String, String>,
    initialized_at: Option<DateTime<Utc>>,
}

/// Outcome of looking up one (app, profile) pair in the merged cache.
#[derive(Debug, Clone, PartialEq)]
pub enum MergedLookup {
    Found(MergedConfig),
    /// Files exist for the pair but their merge failed; carries the reason.
    Failed(String),
    Missing,
}

/// Counts and keys of both caches.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatistics {
    pub file_contents_cache_size: usize,
    pub merged_config_with_sources_cache_size: usize,
    pub total_cache_entries: usize,
    pub cached_filenames: Vec<String>,
    pub cached_configurations: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed_configurations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initialized_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
pub struct CacheStore {
    state: RwLock<Generation>,
    rebuild: Mutex<()>,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize rebuilds. Hold the guard across walking, flattening and [`CacheStore::install`].
    pub fn rebuild_guard(&self) -> MutexGuard<'_, ()> {
        self.rebuild.lock()
    }

    /// Merge every discoverable (app, profile) pair of `files` and swap the result in.
    ///
    /// Pairs whose merge fails are logged and recorded as failures instead of merged
    /// configurations. Returns the number of merged configurations installed.
    pub fn install(&self, files: FileCache, resolver: &PlaceholderResolver<'_>) -> usize {
        let (merged, failures) = build_merged(&files, resolver);
        let count = merged.len();

        let mut state = self.state.write();
        *state = Generation { files, merged, failures, initialized_at: Some(Utc::now()) };
        count
    }

    /// Empty both caches.
    pub fn clear(&self) {
        let _rebuild = self.rebuild.lock();
        let mut state = self.state.write();
        *state = Generation::default();
    }

    /// Copy of the file cache, ordered by filename.
    pub fn files_snapshot(&self) -> BTreeMap<String, RawFile> {
        let state = self.state.read();
        state.files.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    /// Copy of the merged cache, ordered by `app:profile`.
    pub fn merged_snapshot(&self) -> BTreeMap<String, MergedConfig> {
        let state = self.state.read();
        state.merged.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    pub fn raw_file(&self, filename: &str) -> Option<RawFile> {
        self.state.read().files.get(filename).cloned()
    }

    pub fn merged(&self, app: &str, profile: &str) -> Option<MergedConfig> {
        self.state.read().merged.get(&cache_key(app, profile)).cloned()
    }

    /// Merged configuration, recorded failure, or nothing, read under one lock.
    pub fn lookup(&self, app: &str, profile: &str) -> MergedLookup {
        let key = cache_key(app, profile);
        let state = self.state.read();
        if let Some(merged) = state.merged.get(&key) {
            return MergedLookup::Found(merged.clone());
        }
        match state.failures.get(&key) {
            Some(reason) => MergedLookup::Failed(reason.clone()),
            None => MergedLookup::Missing,
        }
    }

    /// Run `f` against the live file cache under the read lock.
    ///
    /// `f` must not call back into this store.
    pub fn with_files<R>(&self, f: impl FnOnce(&FileCache) -> R) -> R {
        let state = self.state.read();
        f(&state.files)
    }

    /// Distinct application names with a merged or failed configuration (the part
    /// before the last `:`).
    pub fn merged_applications(&self) -> BTreeSet<String> {
        let state = self.state.read();
        state
            .merged
            .keys()
            .chain(state.failures.keys())
            .filter_map(|key| key.rsplit_once(':'))
            .map(|(app, _)| app.to_string())
            .collect()
    }

    pub fn statistics(&self) -> CacheStatistics {
        let state = self.state.read();
        let mut cached_filenames: Vec<String> = state.files.keys().cloned().collect();
        cached_filenames.sort();
        let mut cached_configurations: Vec<String> = state.merged.keys().cloned().collect();
        cached_configurations.sort();
        let mut failed_configurations: Vec<String> = state.failures.keys().cloned().collect();
        failed_configurations.sort();

        CacheStatistics {
            file_contents_cache_size: state.files.len(),
            merged_config_with_sources_cache_size: state.merged.len(),
            total_cache_entries: state.files.len() + state.merged.len(),
            cached_filenames,
            cached_configurations,
            failed_configurations,
            initialized_at: state.initialized_at,
        }
    }

    pub fn is_empty(&self) -> bool {
        let state = self.state.read();
        state.files.is_empty() && state.merged.is_empty()
    }
}

fn build_merged(
    files: &FileCache,
    resolver: &PlaceholderResolver<'_>,
) -> (MergedCache, HashMap<String, String>) {
    let mut merged = MergedCache::new();
    let mut failures = HashMap::new();
    for (app, profile) in merge::discover_pairs(files) {
        match merge::merge(files, &app, &profile, resolver) {
            Ok(config) => {
                tracing::debug!("Merged {}:{} ({} keys)", app, profile, config.len());
                merged.insert(cache_key(&app, &profile), config);
            }
            Err(err) => {
                let reason = err.full_message();
                tracing::warn!("Error computing merged config for {}:{}: {}", app, profile, reason);
                failures.insert(cache_key(&app, &profile), reason);
            }
        }
    }
    (merged, failures)
}
