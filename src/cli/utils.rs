//! Shared CLI utilities.

use anyhow::{Context, Result};
use serde::Serialize;

use super::GlobalArgs;
use crate::config::{load_settings, Settings};
use crate::render;
use crate::repository::ConfigRepository;

/// Resolve settings, apply `--root`, and build a repository with initialized caches.
pub fn open_repository(global: &GlobalArgs) -> Result<(ConfigRepository, Settings)> {
    let cwd = std::env::current_dir().context("Failed to read the working directory")?;
    let mut settings = load_settings(&cwd, global.config.as_deref())?;
    if let Some(root) = &global.root {
        settings = settings.with_root_dir(root.clone());
    }

    let repository = ConfigRepository::from_settings(&settings);
    repository
        .initialize_caches()
        .with_context(|| format!("Failed to load configuration from {}", settings.root_dir.display()))?;
    Ok((repository, settings))
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    print!("{}", render::to_json(value)?);
    Ok(())
}
