//! Settings file discovery and layering

use crate::config::Settings;
use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Toml, Yaml};
use figment::Figment;
use std::path::{Path, PathBuf};

/// Prefix of environment variables that override settings, e.g. `CONFIG_ROOT_DIR`.
pub const ENV_PREFIX: &str = "CONFIG_";

const CANDIDATES: [&str; 4] = [
    "config-aggregator.toml",
    ".config-aggregator.toml",
    "config-aggregator.yml",
    "config-aggregator.yaml",
];

/// Load settings for a process started in `cwd`.
///
/// An explicit file that cannot be read or parsed is an error. A discovered file
/// that fails is logged and ignored.
pub fn load_settings(cwd: &Path, explicit: Option<&Path>) -> Result<Settings> {
    load_with_prefix(cwd, explicit, ENV_PREFIX)
}

fn load_with_prefix(cwd: &Path, explicit: Option<&Path>, env_prefix: &str) -> Result<Settings> {
    if let Some(path) = explicit {
        if !path.is_file() {
            anyhow::bail!("Settings file not found: {}", path.display());
        }
        return layered(Some(path), env_prefix)?
            .extract()
            .with_context(|| format!("Invalid settings file: {}", path.display()));
    }

    if let Some(path) = discover_settings(cwd) {
        match layered(Some(&path), env_prefix).and_then(|f| Ok(f.extract::<Settings>()?)) {
            Ok(settings) => return Ok(settings),
            Err(e) => {
                tracing::warn!("Failed to load discovered settings {}: {}", path.display(), e);
            }
        }
    }

    layered(None, env_prefix)?.extract().context("Invalid settings in environment")
}

fn layered(file: Option<&Path>, env_prefix: &str) -> Result<Figment> {
    let mut figment = Figment::from(Serialized::defaults(Settings::default()));
    if let Some(path) = file {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();
        figment = match ext.as_str() {
            "toml" => figment.merge(Toml::file(path)),
            "yml" | "yaml" => figment.merge(Yaml::file(path)),
            other => anyhow::bail!(
                "Unsupported settings extension '.{}' for file {}",
                other,
                path.display()
            ),
        };
    }
    Ok(figment.merge(Env::prefixed(env_prefix)))
}

fn discover_settings(cwd: &Path) -> Option<PathBuf> {
    CANDIDATES.iter().map(|name| cwd.join(name)).find(|path| path.is_file())
}
