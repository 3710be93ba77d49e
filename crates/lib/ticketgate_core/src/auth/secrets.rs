//! Signing secret resolution.
//!
//! Secrets are looked up per `(actor type, token kind)` at the moment a token
//! is issued or verified, never cached at startup, so a missing secret is a
//! request-time [`AuthError::Configuration`].

use std::collections::HashMap;

use tracing::error;

use super::AuthError;
use crate::models::actor::{ActorType, TokenKind};

/// Source of named secrets.
pub trait SecretProvider: Send + Sync {
    fn get(&self, name: &str) -> Option<String>;
}

/// Reads secrets from process environment variables.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSecrets;

impl SecretProvider for EnvSecrets {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|s| !s.is_empty())
    }
}

impl SecretProvider for HashMap<String, String> {
    fn get(&self, name: &str) -> Option<String> {
        HashMap::get(self, name).filter(|s| !s.is_empty()).cloned()
    }
}

/// Resolve the secret for `actor_type`/`kind`, e.g. `USER_ACCESS_SECRET`.
pub fn resolve(
    provider: &dyn SecretProvider,
    actor_type: ActorType,
    kind: TokenKind,
) -> Result<String, AuthError> {
    let name = actor_type.secret_name(kind);
    provider.get(&name).ok_or_else(|| {
        error!(secret = %name, "signing secret not configured");
        AuthError::Configuration(format!("{name} is not set"))
    })
}
