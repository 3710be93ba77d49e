//! Actor persistence.
//!
//! The record store is owned by the wider backend; this crate only needs the
//! narrow [`ActorStore`] contract. [`ActorStores`] binds one store per actor
//! type.

pub mod memory;
pub mod pg;

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::auth::AuthError;
use crate::models::actor::{ActorFilter, ActorRecord, ActorType, ActorUpdate};

pub use memory::MemoryActorStore;
pub use pg::PgActorStore;

/// Time-ordered id for a new actor (UUIDv7).
pub fn new_actor_id() -> String {
    Uuid::now_v7().to_string()
}

#[async_trait]
pub trait ActorStore: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<ActorRecord>, AuthError>;

    async fn find_one(&self, filter: &ActorFilter) -> Result<Option<ActorRecord>, AuthError>;

    /// Apply `update` and return the stored record; `None` if `id` is unknown.
    async fn update(&self, id: &str, update: ActorUpdate)
    -> Result<Option<ActorRecord>, AuthError>;

    /// Persist a new actor. The store assigns `id` when it is empty.
    async fn insert(&self, actor: ActorRecord) -> Result<ActorRecord, AuthError>;
}

/// Store binding per actor type.
#[derive(Clone)]
pub struct ActorStores {
    pub users: Arc<dyn ActorStore>,
    pub organizers: Arc<dyn ActorStore>,
}

impl ActorStores {
    pub fn new(users: Arc<dyn ActorStore>, organizers: Arc<dyn ActorStore>) -> Self {
        Self { users, organizers }
    }

    /// In-memory stores for tests and local development.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryActorStore::new()),
            Arc::new(MemoryActorStore::new()),
        )
    }

    pub fn for_type(&self, actor_type: ActorType) -> Result<&dyn ActorStore, AuthError> {
        match actor_type {
            ActorType::User => Ok(self.users.as_ref()),
            ActorType::Organizer => Ok(self.organizers.as_ref()),
            ActorType::Admin => Err(AuthError::validation(
                "type",
                "admin accounts are not managed by this service",
            )),
        }
    }
}
