//! Shared fixtures for auth tests.

use std::collections::HashMap;
use std::sync::Arc;

use super::jwt::TokenService;
use super::secrets::SecretProvider;
use super::session::AuthService;
use crate::cache::MemoryCache;
use crate::models::actor::NewActor;
use crate::store::ActorStores;

pub(crate) fn secrets() -> Arc<dyn SecretProvider> {
    let map: HashMap<String, String> = [
        "USER_ACCESS_SECRET",
        "USER_REFRESH_SECRET",
        "ORGANIZER_ACCESS_SECRET",
        "ORGANIZER_REFRESH_SECRET",
    ]
    .into_iter()
    .map(|name| (name.to_string(), format!("test-{}", name.to_lowercase())))
    .collect();
    Arc::new(map)
}

/// Auth service over in-memory cache and stores.
pub(crate) fn service() -> AuthService {
    let tokens = TokenService::new(secrets(), Arc::new(MemoryCache::new()));
    AuthService::new(tokens, ActorStores::in_memory())
}

pub(crate) fn new_actor(email: &str, password: &str) -> NewActor {
    NewActor {
        email: email.into(),
        password: password.into(),
        ..NewActor::default()
    }
}
