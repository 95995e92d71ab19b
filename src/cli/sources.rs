//! Sources command implementation

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use super::utils::{open_repository, print_json};
use super::GlobalArgs;
use crate::domain::ConfigSource;

#[derive(Args)]
pub struct SourcesArgs {
    /// Application name
    pub app: String,

    /// Profile name
    pub profile: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SourcesDocument<'a> {
    app: &'a str,
    profile: &'a str,
    property_sources: Vec<ConfigSource>,
}

pub fn run(global: &GlobalArgs, args: SourcesArgs) -> Result<()> {
    let (repository, _) = open_repository(global)?;
    let property_sources = repository.load_sources(&args.app, &args.profile)?;
    print_json(&SourcesDocument { app: &args.app, profile: &args.profile, property_sources })
}
