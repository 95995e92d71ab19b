//! Get command implementation

use anyhow::Result;
use clap::{Args, ValueEnum};
use serde::Serialize;

use super::utils::{open_repository, print_json};
use super::GlobalArgs;
use crate::domain::FlatMap;
use crate::render;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Yaml,
    Json,
    Properties,
}

#[derive(Args)]
pub struct GetArgs {
    /// Application name
    pub app: String,

    /// Profile name (e.g. default, uat, prod)
    pub profile: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "yaml")]
    pub format: OutputFormat,
}

#[derive(Serialize)]
struct Document<'a> {
    application: &'a str,
    profile: &'a str,
    properties: &'a FlatMap,
}

pub fn run(global: &GlobalArgs, args: GetArgs) -> Result<()> {
    let (repository, _) = open_repository(global)?;

    match args.format {
        OutputFormat::Yaml => {
            let tree = repository.merged_deep(&args.app, &args.profile)?;
            print!("{}", render::to_yaml(&tree)?);
        }
        OutputFormat::Json => {
            let properties = repository.merged_flat(&args.app, &args.profile)?;
            print_json(&Document { application: &args.app, profile: &args.profile, properties: &properties })?;
        }
        OutputFormat::Properties => {
            let properties = repository.merged_flat(&args.app, &args.profile)?;
            print!("{}", render::to_properties_text(&properties));
        }
    }
    Ok(())
}
