//! PostgreSQL actor store (`users` / `organizers` tables).

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::PgPool;
use uuid::Uuid;

use super::{ActorStore, new_actor_id};
use crate::auth::AuthError;
use crate::models::actor::{ActorFilter, ActorRecord, ActorUpdate, VerificationChannel};

const COLUMNS: &str = "id::text, email, phone, wallet, document, verified, password_hash, profile";

type ActorRow = (
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    String,
    String,
    Value,
);

fn from_row(row: ActorRow) -> Result<ActorRecord, AuthError> {
    let (id, email, phone, wallet, document, verified, password_hash, profile) = row;
    let verified = verified
        .parse::<VerificationChannel>()
        .map_err(AuthError::Internal)?;
    let profile = match profile {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    Ok(ActorRecord {
        id,
        email,
        phone,
        wallet,
        document,
        verified,
        password_hash,
        profile,
    })
}

/// Identifier column backing a channel; `None` has no column.
fn channel_column(channel: VerificationChannel) -> Option<&'static str> {
    match channel {
        VerificationChannel::Email => Some("email"),
        VerificationChannel::Phone => Some("phone"),
        VerificationChannel::Wallet => Some("wallet"),
        VerificationChannel::Document => Some("document"),
        VerificationChannel::None => None,
    }
}

/// [`ActorStore`] over one actor table.
#[derive(Debug, Clone)]
pub struct PgActorStore {
    pool: PgPool,
    table: &'static str,
}

impl PgActorStore {
    pub fn users(pool: PgPool) -> Self {
        Self {
            pool,
            table: "users",
        }
    }

    pub fn organizers(pool: PgPool) -> Self {
        Self {
            pool,
            table: "organizers",
        }
    }
}

#[async_trait]
impl ActorStore for PgActorStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<ActorRecord>, AuthError> {
        if Uuid::parse_str(id).is_err() {
            return Ok(None);
        }
        let row = sqlx::query_as::<_, ActorRow>(&format!(
            "SELECT {COLUMNS} FROM {} WHERE id = $1::uuid",
            self.table
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(from_row).transpose()
    }

    async fn find_one(&self, filter: &ActorFilter) -> Result<Option<ActorRecord>, AuthError> {
        let Some(column) = channel_column(filter.field) else {
            return Ok(None);
        };
        let row = match filter.verified {
            Some(verified) => {
                sqlx::query_as::<_, ActorRow>(&format!(
                    "SELECT {COLUMNS} FROM {} WHERE {column} = $1 AND verified = $2 LIMIT 1",
                    self.table
                ))
                .bind(&filter.value)
                .bind(verified.as_str())
                .fetch_optional(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, ActorRow>(&format!(
                    "SELECT {COLUMNS} FROM {} WHERE {column} = $1 LIMIT 1",
                    self.table
                ))
                .bind(&filter.value)
                .fetch_optional(&self.pool)
                .await?
            }
        };
        row.map(from_row).transpose()
    }

    async fn update(
        &self,
        id: &str,
        update: ActorUpdate,
    ) -> Result<Option<ActorRecord>, AuthError> {
        if Uuid::parse_str(id).is_err() {
            return Ok(None);
        }
        let row = sqlx::query_as::<_, ActorRow>(&format!(
            "UPDATE {} SET verified = COALESCE($2, verified), \
             password_hash = COALESCE($3, password_hash), updated_at = now() \
             WHERE id = $1::uuid RETURNING {COLUMNS}",
            self.table
        ))
        .bind(id)
        .bind(update.verified.map(|v| v.as_str()))
        .bind(update.password_hash)
        .fetch_optional(&self.pool)
        .await?;
        row.map(from_row).transpose()
    }

    async fn insert(&self, actor: ActorRecord) -> Result<ActorRecord, AuthError> {
        let id = if actor.id.is_empty() {
            new_actor_id()
        } else {
            actor.id
        };
        let row = sqlx::query_as::<_, ActorRow>(&format!(
            "INSERT INTO {} (id, email, phone, wallet, document, verified, password_hash, profile) \
             VALUES ($1::uuid, $2, $3, $4, $5, $6, $7, $8) RETURNING {COLUMNS}",
            self.table
        ))
        .bind(&id)
        .bind(actor.email)
        .bind(actor.phone)
        .bind(actor.wallet)
        .bind(actor.document)
        .bind(actor.verified.as_str())
        .bind(actor.password_hash)
        .bind(Value::Object(actor.profile))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AuthError::Conflict("email already registered".into())
            }
            other => AuthError::DbError(other),
        })?;
        from_row(row)
    }
}
