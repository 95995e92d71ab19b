//! Per-application and all-application comparisons over the repository caches

use crate::compare::diff::{
    compute_differences, side_from_flat, side_from_merged, AggregateStatistics, ComparisonStatistics,
    ConfigDifference, Side,
};
use crate::compare::AggregateFailurePolicy;
use crate::domain::{RawFile, EXTENSION_ORDER};
use crate::error::{ConfigError, Result};
use crate::merge::{split_app_profile, GLOBAL_APPLICATION};
use crate::repository::ConfigRepository;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComparisonType {
    /// Raw `{app}_{profile}` files, no merging.
    Sources,
    /// Merged values with provenance.
    Values,
}

/// Comparison of one application across two profiles.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppComparison {
    pub app: String,
    pub profile_a: String,
    pub profile_b: String,
    pub comparison_type: ComparisonType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_a: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_b: Option<String>,
    pub differences: Vec<ConfigDifference>,
    pub statistics: ComparisonStatistics,
}

/// An application left out of an aggregate because its comparison failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateFailure {
    pub app: String,
    pub error: String,
}

/// Comparison of every application across two profiles.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateComparison {
    pub apps: &'static str,
    pub profile_a: String,
    pub profile_b: String,
    pub comparison_type: ComparisonType,
    pub app_comparisons: Vec<AppComparison>,
    pub statistics: AggregateStatistics,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<AggregateFailure>,
}

pub struct ComparisonEngine<'a> {
    repository: &'a ConfigRepository,
    policy: AggregateFailurePolicy,
}

impl<'a> ComparisonEngine<'a> {
    pub fn new(repository: &'a ConfigRepository) -> Self {
        Self { repository, policy: AggregateFailurePolicy::default() }
    }

    pub fn with_policy(mut self, policy: AggregateFailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Compare `{app}_{profileA}` with `{app}_{profileB}` as stored, without merging.
    ///
    /// A missing file is an empty side labelled `{app}_{profile}`.
    pub fn compare_sources_for_app(&self, app: &str, profile_a: &str, profile_b: &str) -> Result<AppComparison> {
        validate_names(app, profile_a, profile_b)?;
        let files = self.repository.file_contents_cache();
        Ok(source_comparison(&files, app, profile_a, profile_b))
    }

    pub fn compare_sources_for_all_apps(&self, profile_a: &str, profile_b: &str) -> AggregateComparison {
        let files = self.repository.file_contents_cache();
        let applications = applications_from_files(&files);

        self.aggregate(ComparisonType::Sources, applications, profile_a, profile_b, |app| {
            validate_names(app, profile_a, profile_b)?;
            let file_a = find_profile_file(&files, app, profile_a);
            let file_b = find_profile_file(&files, app, profile_b);
            if file_a.is_none() && file_b.is_none() {
                return Ok(None);
            }
            Ok(Some(source_comparison(&files, app, profile_a, profile_b)))
        })
    }

    /// Compare merged values for (app, profileA) and (app, profileB), carrying each
    /// side's winning source file.
    pub fn compare_values_for_app(&self, app: &str, profile_a: &str, profile_b: &str) -> Result<AppComparison> {
        validate_names(app, profile_a, profile_b)?;
        self.value_comparison(app, profile_a, profile_b)
    }

    pub fn compare_values_for_all_apps(&self, profile_a: &str, profile_b: &str) -> AggregateComparison {
        let applications = self.repository.merged_applications();

        self.aggregate(ComparisonType::Values, applications, profile_a, profile_b, |app| {
            validate_names(app, profile_a, profile_b)?;
            let comparison = self.value_comparison(app, profile_a, profile_b)?;
            if comparison.differences.is_empty() {
                return Ok(None);
            }
            Ok(Some(comparison))
        })
    }

    /// A side whose merge failed is an `Unresolved` error, not an empty side.
    fn value_comparison(&self, app: &str, profile_a: &str, profile_b: &str) -> Result<AppComparison> {
        let merged_a = self.repository.resolved_with_sources(app, profile_a)?;
        let merged_b = self.repository.resolved_with_sources(app, profile_b)?;
        let differences =
            compute_differences(&side_from_merged(&merged_a), &side_from_merged(&merged_b), profile_a, profile_b);
        let statistics = ComparisonStatistics::from_differences(&differences, profile_a, profile_b);

        Ok(AppComparison {
            app: app.to_string(),
            profile_a: profile_a.to_string(),
            profile_b: profile_b.to_string(),
            comparison_type: ComparisonType::Values,
            file_a: None,
            file_b: None,
            differences,
            statistics,
        })
    }

    /// Run `compare` per application and sum the included ones.
    ///
    /// `compare` returns `Ok(None)` when neither side has data for the application.
    fn aggregate<F>(
        &self,
        comparison_type: ComparisonType,
        applications: BTreeSet<String>,
        profile_a: &str,
        profile_b: &str,
        compare: F,
    ) -> AggregateComparison
    where
        F: Fn(&str) -> Result<Option<AppComparison>>,
    {
        let mut app_comparisons = Vec::new();
        let mut statistics = AggregateStatistics::new(profile_a, profile_b);
        let mut failures = Vec::new();

        for app in &applications {
            match compare(app) {
                Ok(Some(comparison)) => {
                    statistics.include(&comparison.statistics);
                    app_comparisons.push(comparison);
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::debug!("Skipping {} in aggregate comparison: {}", app, err);
                    if self.policy == AggregateFailurePolicy::Report {
                        failures.push(AggregateFailure { app: app.clone(), error: err.to_string() });
                    }
                }
            }
        }

        AggregateComparison {
            apps: "all",
            profile_a: profile_a.to_string(),
            profile_b: profile_b.to_string(),
            comparison_type,
            app_comparisons,
            statistics,
            failures,
        }
    }
}

fn source_comparison(
    files: &BTreeMap<String, RawFile>,
    app: &str,
    profile_a: &str,
    profile_b: &str,
) -> AppComparison {
    let file_a = find_profile_file(files, app, profile_a);
    let file_b = find_profile_file(files, app, profile_b);
    let label_a = file_a.map(|f| f.filename.clone()).unwrap_or_else(|| format!("{app}_{profile_a}"));
    let label_b = file_b.map(|f| f.filename.clone()).unwrap_or_else(|| format!("{app}_{profile_b}"));

    let side_a: Side = file_a.map(|f| side_from_flat(&f.properties, &label_a)).unwrap_or_default();
    let side_b: Side = file_b.map(|f| side_from_flat(&f.properties, &label_b)).unwrap_or_default();

    let differences = compute_differences(&side_a, &side_b, profile_a, profile_b);
    let statistics = ComparisonStatistics::from_differences(&differences, profile_a, profile_b);

    AppComparison {
        app: app.to_string(),
        profile_a: profile_a.to_string(),
        profile_b: profile_b.to_string(),
        comparison_type: ComparisonType::Sources,
        file_a: Some(label_a),
        file_b: Some(label_b),
        differences,
        statistics,
    }
}

/// `{app}_{profile}.{properties|yml|yaml}`, first match wins.
fn find_profile_file<'f>(files: &'f BTreeMap<String, RawFile>, app: &str, profile: &str) -> Option<&'f RawFile> {
    EXTENSION_ORDER.iter().find_map(|ext| files.get(&format!("{app}_{profile}.{ext}")))
}

/// Applications named by cached files, excluding the global `application` files.
fn applications_from_files(files: &BTreeMap<String, RawFile>) -> BTreeSet<String> {
    files
        .keys()
        .filter_map(|name| split_app_profile(name))
        .map(|(app, _)| app)
        .filter(|app| app != GLOBAL_APPLICATION)
        .collect()
}

fn validate_names(app: &str, profile_a: &str, profile_b: &str) -> Result<()> {
    if app.trim().is_empty() {
        return Err(ConfigError::InvalidArgument("application name is empty".to_string()));
    }
    if app.contains(':') {
        return Err(ConfigError::InvalidArgument(format!("application name '{app}' contains ':'")));
    }
    for profile in [profile_a, profile_b] {
        if profile.trim().is_empty() {
            return Err(ConfigError::InvalidArgument("profile name is empty".to_string()));
        }
        if profile.contains(':') {
            return Err(ConfigError::InvalidArgument(format!("profile name '{profile}' contains ':'")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(root: &Path, app_dir: &str, filename: &str, content: &str) {
        fs::create_dir_all(root.join(app_dir)).unwrap();
        fs::write(root.join(app_dir).join(filename), content).unwrap();
    }

    fn repository(temp: &TempDir) -> ConfigRepository {
        let repo = ConfigRepository::new(temp.path());
        repo.initialize_caches().unwrap();
        repo
    }

    fn fixture() -> TempDir {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "shared", "application_default.properties", "log.level=INFO\n");
        write(temp.path(), "svc", "svc_default.properties", "a=1\nb=2\n");
        write(temp.path(), "svc", "svc_uat.properties", "b=3\nc=4\n");
        write(temp.path(), "svc", "svc_prod.yml", "b: 3\nd: 5\n");
        write(temp.path(), "web", "web_uat.properties", "port=8080\n");
        temp
    }

    #[test]
    fn test_sources_compare_raw_files() {
        let temp = fixture();
        let repo = repository(&temp);
        let engine = ComparisonEngine::new(&repo);

        let result = engine.compare_sources_for_app("svc", "uat", "prod").unwrap();
        assert_eq!(result.file_a.as_deref(), Some("svc_uat.properties"));
        assert_eq!(result.file_b.as_deref(), Some("svc_prod.yml"));
        assert_eq!(result.comparison_type, ComparisonType::Sources);

        let statuses: Vec<(&str, &str)> =
            result.differences.iter().map(|d| (d.key.as_str(), d.status.as_str())).collect();
        assert_eq!(statuses, vec![("d", "uat-missing"), ("c", "prod-missing"), ("b", "SAME")]);
        assert_eq!(result.statistics.total, 3);
        assert!(result.statistics.is_consistent());
    }

    #[test]
    fn test_sources_missing_file_is_empty_side() {
        let temp = fixture();
        let repo = repository(&temp);
        let engine = ComparisonEngine::new(&repo);

        let result = engine.compare_sources_for_app("web", "uat", "prod").unwrap();
        assert_eq!(result.file_b.as_deref(), Some("web_prod"));
        assert_eq!(result.differences.len(), 1);
        assert_eq!(result.differences[0].status, "prod-missing");
        assert_eq!(result.differences[0].value_b, "NOT_FOUND");
        assert_eq!(result.statistics.missing_in_b, 1);
    }

    #[test]
    fn test_values_compare_merged_with_provenance() {
        let temp = fixture();
        let repo = repository(&temp);
        let engine = ComparisonEngine::new(&repo);

        let result = engine.compare_values_for_app("svc", "uat", "prod").unwrap();
        assert!(result.file_a.is_none());
        let by_key = |key: &str| result.differences.iter().find(|d| d.key == key).unwrap();

        assert_eq!(by_key("a").status, "SAME");
        assert_eq!(by_key("a").source_a, "svc_default.properties");
        assert_eq!(by_key("log.level").status, "SAME");
        assert_eq!(by_key("b").status, "SAME");
        assert_eq!(by_key("b").source_a, "svc_uat.properties");
        assert_eq!(by_key("b").source_b, "svc_prod.yml");
        assert_eq!(by_key("c").status, "prod-missing");
        assert_eq!(by_key("d").status, "uat-missing");
    }

    #[test]
    fn test_swapping_profiles_mirrors_result() {
        let temp = fixture();
        let repo = repository(&temp);
        let engine = ComparisonEngine::new(&repo);

        let forward = engine.compare_values_for_app("svc", "uat", "prod").unwrap();
        let backward = engine.compare_values_for_app("svc", "prod", "uat").unwrap();

        assert_eq!(forward.statistics.total, backward.statistics.total);
        assert_eq!(forward.statistics.matched, backward.statistics.matched);
        assert_eq!(forward.statistics.no_match, backward.statistics.no_match);
        assert_eq!(forward.statistics.missing_in_a, backward.statistics.missing_in_b);
        assert_eq!(forward.statistics.missing_in_b, backward.statistics.missing_in_a);

        for diff in &forward.differences {
            let mirrored = backward.differences.iter().find(|d| d.key == diff.key).unwrap();
            assert_eq!(mirrored.value_a, diff.value_b);
            assert_eq!(mirrored.source_b, diff.source_a);
        }
    }

    #[test]
    fn test_sources_for_all_apps_sums_included_apps() {
        let temp = fixture();
        let repo = repository(&temp);
        let engine = ComparisonEngine::new(&repo);

        let result = engine.compare_sources_for_all_apps("uat", "prod");
        let apps: Vec<&str> = result.app_comparisons.iter().map(|c| c.app.as_str()).collect();
        assert_eq!(apps, vec!["svc", "web"]);
        assert_eq!(result.statistics.total_apps, 2);
        assert_eq!(result.statistics.counters.total, 4);
        assert_eq!(result.apps, "all");
        assert!(result.failures.is_empty());
    }

    #[test]
    fn test_all_apps_skips_apps_without_data() {
        let temp = fixture();
        let repo = repository(&temp);
        let engine = ComparisonEngine::new(&repo);

        let result = engine.compare_sources_for_all_apps("dev", "qa");
        assert!(result.app_comparisons.is_empty());
        assert_eq!(result.statistics.total_apps, 0);

        let values = engine.compare_values_for_all_apps("uat", "prod");
        let apps: Vec<&str> = values.app_comparisons.iter().map(|c| c.app.as_str()).collect();
        assert!(apps.contains(&"svc"));
        assert!(apps.contains(&"web"));
    }

    #[test]
    fn test_invalid_names_are_rejected() {
        let temp = fixture();
        let repo = repository(&temp);
        let engine = ComparisonEngine::new(&repo);

        let err = engine.compare_sources_for_app("", "uat", "prod").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidArgument(_)));
        let err = engine.compare_values_for_app("svc", "u:at", "prod").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidArgument(_)));
    }

    #[test]
    fn test_report_policy_lists_failed_apps() {
        let temp = fixture();
        write(temp.path(), "odd", "a:b_uat.properties", "x=1\n");
        let repo = repository(&temp);

        let skipped = ComparisonEngine::new(&repo).compare_sources_for_all_apps("uat", "prod");
        assert!(skipped.failures.is_empty());
        assert!(skipped.app_comparisons.iter().all(|c| c.app != "a:b"));

        let reported = ComparisonEngine::new(&repo)
            .with_policy(AggregateFailurePolicy::Report)
            .compare_sources_for_all_apps("uat", "prod");
        assert_eq!(reported.failures.len(), 1);
        assert_eq!(reported.failures[0].app, "a:b");

        let encoded = serde_json::to_value(&reported).unwrap();
        assert_eq!(encoded["failures"][0]["app"], "a:b");
        assert_eq!(encoded["comparisonType"], "sources");
    }

    #[test]
    fn test_failed_merge_is_reported_not_compared_as_empty() {
        let temp = fixture();
        write(temp.path(), "vaulted", "vaulted_uat.properties", "pw=${vault:db/password}
");
        write(temp.path(), "vaulted", "vaulted_prod.properties", "pw=plain
");

        let mut registry = crate::resolve::SecretResolverRegistry::empty();
        registry.register_fn("vault", |_| Err("sealed".into()));
        let repo = ConfigRepository::new(temp.path()).with_registry(registry);
        repo.initialize_caches().unwrap();
        let engine = ComparisonEngine::new(&repo).with_policy(AggregateFailurePolicy::Report);

        let err = engine.compare_values_for_app("vaulted", "uat", "prod").unwrap_err();
        assert!(matches!(err, ConfigError::Unresolved { .. }));

        let aggregate = engine.compare_values_for_all_apps("uat", "prod");
        assert!(aggregate.app_comparisons.iter().all(|c| c.app != "vaulted"));
        assert_eq!(aggregate.failures.len(), 1);
        assert_eq!(aggregate.failures[0].app, "vaulted");
        assert!(aggregate.failures[0].error.contains("sealed"));
    }
}
