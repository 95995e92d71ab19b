//! Prefix-keyed registry of secret resolvers

use crate::error::BoxError;
use crate::resolve::stubs::StubSecretResolver;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Turns a secret path into its value.
pub trait SecretResolver: Send + Sync {
    fn resolve(&self, path: &str) -> Result<String, BoxError>;
}

/// Adapter so plain closures can be registered as resolvers.
pub struct FnResolver<F>(pub F);

impl<F> SecretResolver for FnResolver<F>
where
    F: Fn(&str) -> Result<String, BoxError> + Send + Sync,
{
    fn resolve(&self, path: &str) -> Result<String, BoxError> {
        (self.0)(path)
    }
}

/// Map from case-sensitive prefix (`vault`, `cyberark`) to resolver.
///
/// At most one resolver per prefix; registering an existing prefix replaces it.
#[derive(Clone)]
pub struct SecretResolverRegistry {
    resolvers: HashMap<String, Arc<dyn SecretResolver>>,
}

impl SecretResolverRegistry {
    /// Registry with the built-in `vault` and `cyberark` resolvers.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(StubSecretResolver::VAULT_PREFIX, StubSecretResolver::vault());
        registry.register(StubSecretResolver::CYBERARK_PREFIX, StubSecretResolver::cyberark());
        registry
    }

    pub fn empty() -> Self {
        Self { resolvers: HashMap::new() }
    }

    pub fn register<R>(&mut self, prefix: impl Into<String>, resolver: R)
    where
        R: SecretResolver + 'static,
    {
        let prefix = prefix.into();
        if self.resolvers.insert(prefix.clone(), Arc::new(resolver)).is_some() {
            tracing::debug!("Replaced secret resolver for prefix '{}'", prefix);
        }
    }

    pub fn register_fn<F>(&mut self, prefix: impl Into<String>, resolve: F)
    where
        F: Fn(&str) -> Result<String, BoxError> + Send + Sync + 'static,
    {
        self.register(prefix, FnResolver(resolve));
    }

    pub fn get(&self, prefix: &str) -> Option<Arc<dyn SecretResolver>> {
        self.resolvers.get(prefix).cloned()
    }

    pub fn contains(&self, prefix: &str) -> bool {
        self.resolvers.contains_key(prefix)
    }

    /// Sorted snapshot of registered prefixes.
    pub fn prefixes(&self) -> Vec<String> {
        let mut prefixes: Vec<String> = self.resolvers.keys().cloned().collect();
        prefixes.sort();
        prefixes
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }
}

impl Default for SecretResolverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SecretResolverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretResolverRegistry").field("prefixes", &self.prefixes()).finish()
    }
}
