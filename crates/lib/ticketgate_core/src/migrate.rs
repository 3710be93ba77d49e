//! Database migration support.
//!
//! Embeds the actor table migrations from `ticketgate_core/migrations/`.

use sqlx::PgPool;

/// Create or upgrade the `users` and `organizers` tables.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
