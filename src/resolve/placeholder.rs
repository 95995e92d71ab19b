//! Three-pass `${...}` rewriting
//!
//! Each pass scans the string once; replacement text is never re-scanned by the
//! pass that produced it, but later passes see it.

use crate::domain::{value_text, FlatMap};
use crate::error::{ConfigError, Result};
use crate::resolve::environment::EnvironmentSource;
use crate::resolve::registry::SecretResolverRegistry;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;

/// `${name}` with no colon: config references and environment variables.
static PLAIN_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([^:}]+)\}").expect("valid placeholder regex"));

pub struct PlaceholderResolver<'a> {
    registry: &'a SecretResolverRegistry,
    environment: &'a dyn EnvironmentSource,
    /// `${(prefix1|prefix2):(path)}` over every registered prefix; `None` when the registry is empty.
    secret_pattern: Option<Regex>,
}

impl<'a> PlaceholderResolver<'a> {
    /// Fails when the secret pattern over the registered prefixes cannot be compiled.
    pub fn new(registry: &'a SecretResolverRegistry, environment: &'a dyn EnvironmentSource) -> Result<Self> {
        let prefixes = registry.prefixes();
        let secret_pattern = if prefixes.is_empty() {
            None
        } else {
            let alternation =
                prefixes.iter().map(|p| regex::escape(p)).collect::<Vec<_>>().join("|");
            let pattern = format!(r"\$\{{({alternation}):([^}}]+)\}}");
            let compiled = Regex::new(&pattern).map_err(|e| {
                ConfigError::Internal(format!(
                    "cannot build secret placeholder pattern for {} prefixes: {e}",
                    prefixes.len()
                ))
            })?;
            Some(compiled)
        };
        Ok(Self { registry, environment, secret_pattern })
    }

    /// Resolve every string value of `map`, using `map` itself for `${key}` lookups.
    pub fn resolve_map(&self, map: &FlatMap) -> Result<FlatMap> {
        let mut resolved = FlatMap::new();
        for (key, value) in map {
            let value = match value {
                Value::String(s) => Value::String(self.resolve_value(s, map)?),
                other => other.clone(),
            };
            resolved.insert(key.clone(), value);
        }
        Ok(resolved)
    }

    /// Resolve one string value against `context`.
    pub fn resolve_value(&self, value: &str, context: &FlatMap) -> Result<String> {
        if !value.contains("${") {
            return Ok(value.to_string());
        }
        let value = self.resolve_secrets(value)?;
        let value = resolve_config_references(&value, context);
        Ok(self.resolve_environment(&value))
    }

    /// Pass 1: `${prefix:path}` for registered prefixes. Unknown prefixes stay literal.
    pub fn resolve_secrets(&self, value: &str) -> Result<String> {
        let Some(pattern) = &self.secret_pattern else {
            return Ok(value.to_string());
        };
        if !value.contains("${") {
            return Ok(value.to_string());
        }

        let mut out = String::with_capacity(value.len());
        let mut last = 0;
        for caps in pattern.captures_iter(value) {
            let (Some(whole), Some(prefix), Some(path)) = (caps.get(0), caps.get(1), caps.get(2))
            else {
                continue;
            };
            let resolver = self.registry.get(prefix.as_str()).ok_or_else(|| {
                ConfigError::Internal(format!("resolver for '{}' vanished", prefix.as_str()))
            })?;
            let secret = resolver.resolve(path.as_str()).map_err(|source| {
                ConfigError::SecretResolution {
                    prefix: prefix.as_str().to_string(),
                    path: path.as_str().to_string(),
                    source,
                }
            })?;
            out.push_str(&value[last..whole.start()]);
            out.push_str(&secret);
            last = whole.end();
        }
        out.push_str(&value[last..]);
        Ok(out)
    }

    /// Pass 3: `${NAME}` from the environment source. Unknown names stay literal.
    pub fn resolve_environment(&self, value: &str) -> String {
        if !value.contains("${") {
            return value.to_string();
        }
        PLAIN_PLACEHOLDER
            .replace_all(value, |caps: &Captures| {
                self.environment.lookup(&caps[1]).unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }
}

/// Pass 2: `${key}` looked up in the merge-in-progress map. Unknown keys stay literal.
pub fn resolve_config_references(value: &str, context: &FlatMap) -> String {
    if !value.contains("${") {
        return value.to_string();
    }
    PLAIN_PLACEHOLDER
        .replace_all(value, |caps: &Captures| match context.get(&caps[1]) {
            Some(found) => value_text(found),
            None => caps[0].to_string(),
        })
        .into_owned()
}
