//! Built-in stand-in secret backends
//!
//! These never touch the network. Values are derived from the secret path so that
//! repeated merges produce identical output. A real backend must bound its own
//! calls with a timeout.

use crate::error::BoxError;
use crate::resolve::registry::SecretResolver;
use crate::utils::stable_hash;

#[derive(Debug, Clone)]
pub struct StubSecretResolver {
    name: &'static str,
    api_key: &'static str,
}

impl StubSecretResolver {
    pub const VAULT_PREFIX: &'static str = "vault";
    pub const CYBERARK_PREFIX: &'static str = "cyberark";

    pub fn vault() -> Self {
        Self { name: Self::VAULT_PREFIX, api_key: "vault-api-key-9876543210" }
    }

    pub fn cyberark() -> Self {
        Self { name: Self::CYBERARK_PREFIX, api_key: "cyberark-api-key-1234567890" }
    }
}

impl SecretResolver for StubSecretResolver {
    fn resolve(&self, path: &str) -> Result<String, BoxError> {
        let name = self.name;
        let digest = stable_hash(path);
        let value = if path.contains("password") {
            format!("{name}-resolved-password-{digest}")
        } else if path.contains("token") {
            format!("{name}-resolved-token-{digest}")
        } else if path.contains("api-key") {
            self.api_key.to_string()
        } else if path.contains("secret") {
            format!("{name}-secret-{digest}")
        } else {
            format!("[{}:{}]", name.to_ascii_uppercase(), path)
        };
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vault_resolves_by_path_shape() {
        let vault = StubSecretResolver::vault();
        assert!(vault.resolve("db/password").unwrap().starts_with("vault-resolved-password-"));
        assert!(vault.resolve("ci/token").unwrap().starts_with("vault-resolved-token-"));
        assert_eq!(vault.resolve("payments/api-key").unwrap(), "vault-api-key-9876543210");
        assert!(vault.resolve("app/secret").unwrap().starts_with("vault-secret-"));
        assert_eq!(vault.resolve("plain/value").unwrap(), "[VAULT:plain/value]");
    }

    #[test]
    fn cyberark_resolves_by_path_shape() {
        let cyberark = StubSecretResolver::cyberark();
        assert!(cyberark.resolve("db/password").unwrap().starts_with("cyberark-resolved-password-"));
        assert_eq!(cyberark.resolve("x/api-key").unwrap(), "cyberark-api-key-1234567890");
        assert_eq!(cyberark.resolve("other").unwrap(), "[CYBERARK:other]");
    }

    #[test]
    fn resolution_is_deterministic() {
        let vault = StubSecretResolver::vault();
        assert_eq!(vault.resolve("db/password").unwrap(), vault.resolve("db/password").unwrap());
        assert_ne!(vault.resolve("db/password").unwrap(), vault.resolve("mq/password").unwrap());
    }
}
