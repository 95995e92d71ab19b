//! Placeholder and secret resolution
//!
//! Values are rewritten in three fixed passes: `${prefix:path}` secrets, then
//! `${key}` references into the same merged map, then `${NAME}` environment
//! variables.

pub mod environment;
pub mod placeholder;
pub mod registry;
pub mod stubs;

pub use environment::{EnvironmentSource, ProcessEnvironment};
pub use placeholder::PlaceholderResolver;
pub use registry::{FnResolver, SecretResolver, SecretResolverRegistry};
pub use stubs::StubSecretResolver;
