//! Error types for the merge, cache and comparison engines

use std::path::PathBuf;
use thiserror::Error;

/// Boxed error returned by secret backends.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// No applicable files (or no cached merge) for the requested pair.
    #[error("no configuration for app={app}, profile={profile}")]
    NotFound { app: String, profile: String },

    /// A single source file could not be parsed.
    #[error("malformed source {file}: {reason}")]
    MalformedSource { file: String, reason: String },

    /// A secret backend failed while resolving `${prefix:path}`.
    #[error("failed to resolve {prefix} secret '{path}'")]
    SecretResolution {
        prefix: String,
        path: String,
        #[source]
        source: BoxError,
    },

    /// Files exist for the pair but merging them failed during the last initialization.
    #[error("configuration for app={app}, profile={profile} could not be resolved: {reason}")]
    Unresolved { app: String, profile: String, reason: String },

    /// Caller supplied an application or profile name that cannot be addressed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("failed reading {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to encode YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ConfigError {
    pub fn not_found(app: &str, profile: &str) -> Self {
        Self::NotFound { app: app.to_string(), profile: profile.to_string() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// This error's message followed by each of its causes, joined with `: `.
    pub fn full_message(&self) -> String {
        let mut message = self.to_string();
        let mut cause = std::error::Error::source(self);
        while let Some(err) = cause {
            message.push_str(": ");
            message.push_str(&err.to_string());
            cause = err.source();
        }
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn not_found_message_names_app_and_profile() {
        let err = ConfigError::not_found("ghost", "x");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "no configuration for app=ghost, profile=x");
    }

    #[test]
    fn secret_resolution_keeps_cause() {
        let err = ConfigError::SecretResolution {
            prefix: "vault".into(),
            path: "db/password".into(),
            source: "backend unreachable".into(),
        };
        assert_eq!(err.to_string(), "failed to resolve vault secret 'db/password'");
        assert_eq!(err.source().map(|s| s.to_string()).as_deref(), Some("backend unreachable"));
        assert_eq!(
            err.full_message(),
            "failed to resolve vault secret 'db/password': backend unreachable"
        );
    }

    #[test]
    fn unresolved_is_not_not_found() {
        let err = ConfigError::Unresolved {
            app: "svc".into(),
            profile: "uat".into(),
            reason: "sealed".into(),
        };
        assert!(!err.is_not_found());
        assert_eq!(err.to_string(), "configuration for app=svc, profile=uat could not be resolved: sealed");
    }
}
