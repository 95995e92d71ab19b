//! config-aggregator: profile-aware configuration merging
//!
//! Walks a directory of per-application `.properties` / `.yml` / `.yaml` files,
//! flattens them, merges them by precedence for each (application, profile)
//! pair, resolves `${...}` placeholders and secrets, caches the results and
//! compares profiles against each other.

pub mod cache;
pub mod cli;
pub mod compare;
pub mod config;
pub mod domain;
pub mod error;
pub mod flatten;
pub mod merge;
pub mod render;
pub mod repository;
pub mod resolve;
pub mod scan;
pub mod utils;

pub use compare::{AggregateFailurePolicy, ComparisonEngine};
pub use config::Settings;
pub use domain::{ConfigSource, FlatMap, FlatSources, MergedConfig, RawFile, SourceTaggedValue};
pub use error::{ConfigError, Result};
pub use repository::ConfigRepository;
pub use resolve::{SecretResolver, SecretResolverRegistry};
