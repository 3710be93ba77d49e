//! In-memory actor store.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::{ActorStore, new_actor_id};
use crate::auth::AuthError;
use crate::models::actor::{ActorFilter, ActorRecord, ActorUpdate};

/// DashMap-backed [`ActorStore`] keyed by actor id.
///
/// Emails are unique, as with the `UNIQUE` column in Postgres: `insert`
/// claims the address before the record lands, so concurrent sign-ups with
/// one email cannot both succeed.
#[derive(Debug, Default)]
pub struct MemoryActorStore {
    actors: DashMap<String, ActorRecord>,
    /// email -> actor id
    emails: DashMap<String, String>,
}

impl MemoryActorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ActorStore for MemoryActorStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<ActorRecord>, AuthError> {
        Ok(self.actors.get(id).map(|a| a.value().clone()))
    }

    async fn find_one(&self, filter: &ActorFilter) -> Result<Option<ActorRecord>, AuthError> {
        Ok(self
            .actors
            .iter()
            .find(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone()))
    }

    async fn update(
        &self,
        id: &str,
        update: ActorUpdate,
    ) -> Result<Option<ActorRecord>, AuthError> {
        let Some(mut actor) = self.actors.get_mut(id) else {
            return Ok(None);
        };
        if let Some(verified) = update.verified {
            actor.verified = verified;
        }
        if let Some(hash) = update.password_hash {
            actor.password_hash = hash;
        }
        Ok(Some(actor.value().clone()))
    }

    async fn insert(&self, mut actor: ActorRecord) -> Result<ActorRecord, AuthError> {
        if actor.id.is_empty() {
            actor.id = new_actor_id();
        }
        // Lock order: emails, then actors.
        let email_slot = match actor.email.clone() {
            Some(email) => match self.emails.entry(email) {
                Entry::Occupied(_) => {
                    return Err(AuthError::Conflict("Email already registered".into()));
                }
                Entry::Vacant(slot) => Some(slot),
            },
            None => None,
        };
        let Entry::Vacant(id_slot) = self.actors.entry(actor.id.clone()) else {
            return Err(AuthError::Conflict(format!("actor {} already exists", actor.id)));
        };
        if let Some(slot) = email_slot {
            slot.insert(actor.id.clone());
        }
        id_slot.insert(actor.clone());
        Ok(actor)
    }
}
