//! Service settings
//!
//! Layered lowest to highest: built-in defaults, a settings file, then
//! `CONFIG_*` environment variables. CLI flags are applied by the caller.

pub mod loader;
pub mod settings;

pub use loader::{load_settings, ENV_PREFIX};
pub use settings::Settings;
