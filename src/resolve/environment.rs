//! Environment lookups for the last placeholder pass

use std::collections::HashMap;

/// Where `${NAME}` templates left after the first two passes are looked up.
pub trait EnvironmentSource: Send + Sync {
    fn lookup(&self, name: &str) -> Option<String>;
}

/// The current process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl EnvironmentSource for ProcessEnvironment {
    fn lookup(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvironmentSource for HashMap<String, String> {
    fn lookup(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}
