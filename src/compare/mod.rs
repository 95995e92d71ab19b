//! Profile-to-profile comparison of raw sources and merged values

pub mod diff;
pub mod engine;

pub use diff::{
    compute_differences, AggregateStatistics, ComparisonStatistics, ConfigDifference, DiffStatus,
};
pub use engine::{AggregateComparison, AggregateFailure, AppComparison, ComparisonEngine, ComparisonType};

use serde::{Deserialize, Serialize};

/// What an all-application comparison does with an application that fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateFailurePolicy {
    /// Leave it out and log at debug level.
    #[default]
    Skip,
    /// Leave it out and list it under `failures`.
    Report,
}
