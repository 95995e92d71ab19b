//! Configuration repository: lifecycle and read operations over one cache

use crate::cache::{CacheStatistics, CacheStore, MergedLookup};
use crate::config::Settings;
use crate::domain::{ConfigSource, FileCache, FlatMap, FlatSources, MergedConfig, RawFile};
use crate::error::{ConfigError, Result};
use crate::flatten::{load_raw_file, unflatten};
use crate::merge;
use crate::resolve::{EnvironmentSource, PlaceholderResolver, ProcessEnvironment, SecretResolverRegistry};
use crate::scan::walk_config_root;
use rayon::prelude::*;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Merged view of one configuration directory tree.
///
/// Layout: `<root>/<app-dir>/<app>_<profile>.{properties,yml,yaml}`; global files
/// are named `application_<profile>.*`.
pub struct ConfigRepository {
    root: PathBuf,
    follow_symlinks: bool,
    registry: SecretResolverRegistry,
    environment: Arc<dyn EnvironmentSource>,
    cache: CacheStore,
}

impl ConfigRepository {
    /// Repository over `root` with the built-in secret resolvers and the process
    /// environment. Caches start empty; call [`ConfigRepository::initialize_caches`].
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            follow_symlinks: true,
            registry: SecretResolverRegistry::new(),
            environment: Arc::new(ProcessEnvironment),
            cache: CacheStore::new(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.root_dir.clone()).with_follow_symlinks(settings.follow_symlinks)
    }

    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    pub fn with_registry(mut self, registry: SecretResolverRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_environment(mut self, environment: impl EnvironmentSource + 'static) -> Self {
        self.environment = Arc::new(environment);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn registry(&self) -> &SecretResolverRegistry {
        &self.registry
    }

    /// Registered resolvers take effect on the next initialization.
    pub fn registry_mut(&mut self) -> &mut SecretResolverRegistry {
        &mut self.registry
    }

    /// Walk the root, flatten every file and rebuild both caches.
    ///
    /// Malformed or empty files are skipped. A missing root leaves both caches
    /// empty. On walk failure the previous generation stays in place.
    pub fn initialize_caches(&self) -> Result<()> {
        let _rebuild = self.cache.rebuild_guard();

        let (sources, walk_stats) = walk_config_root(&self.root, self.follow_symlinks)?;
        tracing::debug!(
            "Walked {}: {} app dirs, {} files, {} skipped by extension, {} unreadable, {} symlinks skipped",
            self.root.display(),
            walk_stats.app_dirs,
            walk_stats.files_seen,
            walk_stats.files_skipped_extension,
            walk_stats.files_unreadable,
            walk_stats.symlinks_skipped
        );

        let loaded: Vec<Option<RawFile>> = sources
            .par_iter()
            .map(|source| match load_raw_file(source) {
                Ok(raw) => raw,
                Err(err) => {
                    tracing::warn!("Error loading {}: {}", source.filename, err);
                    None
                }
            })
            .collect();

        let mut files = FileCache::new();
        for raw in loaded.into_iter().flatten() {
            if let Some(previous) = files.insert(raw.filename.clone(), raw) {
                tracing::warn!(
                    "Duplicate config filename {}; keeping the last one walked",
                    previous.filename
                );
            }
        }

        let file_count = files.len();
        let resolver = PlaceholderResolver::new(&self.registry, self.environment.as_ref())?;
        let merged_count = self.cache.install(files, &resolver);

        tracing::info!(
            "Caches initialized: {} files, {} merged configs",
            file_count,
            merged_count
        );
        Ok(())
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
        tracing::info!("Caches cleared");
    }

    /// Merged values for (app, profile) with provenance stripped.
    ///
    /// `Unresolved` when the pair's files exist but their merge failed, `NotFound`
    /// when nothing applies.
    pub fn merged_flat(&self, app: &str, profile: &str) -> Result<FlatMap> {
        match self.resolved_with_sources(app, profile)? {
            merged if !merged.is_empty() => Ok(merged.to_flat()),
            _ => Err(ConfigError::not_found(app, profile)),
        }
    }

    /// Same data as [`ConfigRepository::merged_flat`], nested by splitting keys on `.`.
    pub fn merged_deep(&self, app: &str, profile: &str) -> Result<Value> {
        let flat = self.merged_flat(app, profile)?;
        Ok(unflatten(&flat))
    }

    /// Merged values with the winning file per key; empty when nothing is cached
    /// or the merge failed.
    pub fn merged_with_sources(&self, app: &str, profile: &str) -> MergedConfig {
        self.cache.merged(app, profile).unwrap_or_default()
    }

    /// Like [`ConfigRepository::merged_with_sources`], but a failed merge is an
    /// `Unresolved` error instead of an empty configuration.
    pub fn resolved_with_sources(&self, app: &str, profile: &str) -> Result<MergedConfig> {
        match self.cache.lookup(app, profile) {
            MergedLookup::Found(merged) => Ok(merged),
            MergedLookup::Missing => Ok(MergedConfig::default()),
            MergedLookup::Failed(reason) => Err(ConfigError::Unresolved {
                app: app.to_string(),
                profile: profile.to_string(),
                reason,
            }),
        }
    }

    /// Each applicable file as its own source, lowest precedence first.
    pub fn load_sources(&self, app: &str, profile: &str) -> Result<Vec<ConfigSource>> {
        let sources: Vec<ConfigSource> = self.cache.with_files(|files| {
            merge::applicable_files(files, app, profile)
                .into_iter()
                .map(ConfigSource::from_raw)
                .collect()
        });
        if sources.is_empty() {
            return Err(ConfigError::not_found(app, profile));
        }
        Ok(sources)
    }

    /// Key -> filename that last defines it, without merging values. Keys keep
    /// first-seen order across files in precedence order.
    pub fn sources_for_config(&self, app: &str, profile: &str) -> FlatSources {
        self.cache.with_files(|files| merge::sources_for(files, app, profile))
    }

    pub fn raw_file(&self, filename: &str) -> Option<RawFile> {
        self.cache.raw_file(filename)
    }

    pub fn file_contents_cache(&self) -> BTreeMap<String, RawFile> {
        self.cache.files_snapshot()
    }

    pub fn merged_config_with_sources_cache(&self) -> BTreeMap<String, MergedConfig> {
        self.cache.merged_snapshot()
    }

    /// Applications with at least one merged or failed configuration.
    pub fn merged_applications(&self) -> BTreeSet<String> {
        self.cache.merged_applications()
    }

    pub fn cache_statistics(&self) -> CacheStatistics {
        self.cache.statistics()
    }
}
