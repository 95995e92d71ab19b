use crate::compare::AggregateFailurePolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_ROOT_DIR: &str = "config-repo";
pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 300;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory holding one sub-directory per application.
    pub root_dir: PathBuf,
    /// Carried for callers that refresh on a timer; the caches never expire on their own.
    pub cache_ttl_seconds: u64,
    pub aggregate_failure_policy: AggregateFailurePolicy,
    /// Follow symbolic links to application directories and files.
    pub follow_symlinks: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from(DEFAULT_ROOT_DIR),
            cache_ttl_seconds: DEFAULT_CACHE_TTL_SECONDS,
            aggregate_failure_policy: AggregateFailurePolicy::Skip,
            follow_symlinks: true,
        }
    }
}

impl Settings {
    pub fn with_root_dir(mut self, root_dir: impl Into<PathBuf>) -> Self {
        self.root_dir = root_dir.into();
        self
    }
}
