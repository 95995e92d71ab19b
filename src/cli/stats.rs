//! Stats command implementation

use anyhow::Result;
use serde::Serialize;

use super::utils::{open_repository, print_json};
use super::GlobalArgs;
use crate::cache::CacheStatistics;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatsDocument {
    #[serde(flatten)]
    statistics: CacheStatistics,
    root_dir: String,
    cache_ttl_seconds: u64,
    secret_prefixes: Vec<String>,
}

pub fn run(global: &GlobalArgs) -> Result<()> {
    let (repository, settings) = open_repository(global)?;
    print_json(&StatsDocument {
        statistics: repository.cache_statistics(),
        root_dir: repository.root().display().to_string(),
        cache_ttl_seconds: settings.cache_ttl_seconds,
        secret_prefixes: repository.registry().prefixes(),
    })
}
