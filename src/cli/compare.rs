//! Compare command implementation

use anyhow::Result;
use clap::{Args, ValueEnum};

use super::utils::{open_repository, print_json};
use super::GlobalArgs;
use crate::compare::ComparisonEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CompareMode {
    /// Raw `{app}_{profile}` files, no merging
    Sources,
    /// Merged values with the winning file per key
    Values,
}

#[derive(Args)]
pub struct CompareArgs {
    /// What to compare
    #[arg(value_enum)]
    pub mode: CompareMode,

    /// Application name, or `all` for every application
    pub app: String,

    /// First profile
    pub profile_a: String,

    /// Second profile
    pub profile_b: String,
}

pub fn run(global: &GlobalArgs, args: CompareArgs) -> Result<()> {
    let (repository, settings) = open_repository(global)?;
    let engine = ComparisonEngine::new(&repository).with_policy(settings.aggregate_failure_policy);
    let (a, b) = (args.profile_a.as_str(), args.profile_b.as_str());

    if args.app.eq_ignore_ascii_case("all") {
        let result = match args.mode {
            CompareMode::Sources => engine.compare_sources_for_all_apps(a, b),
            CompareMode::Values => engine.compare_values_for_all_apps(a, b),
        };
        return print_json(&result);
    }

    let result = match args.mode {
        CompareMode::Sources => engine.compare_sources_for_app(&args.app, a, b)?,
        CompareMode::Values => engine.compare_values_for_app(&args.app, a, b)?,
    };
    print_json(&result)
}
