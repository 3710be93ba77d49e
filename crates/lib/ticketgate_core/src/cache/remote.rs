//! Redis cache backend.
//!
//! Every call is a network round-trip bounded by `op_timeout`. Errors are
//! logged here and surfaced as [`CacheError`] so callers never see client
//! internals.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tracing::{error, info};

use super::{CacheError, SessionCache};

/// Default per-operation timeout.
pub const DEFAULT_OP_TIMEOUT: Duration = Duration::from_secs(2);

/// [`SessionCache`] over a Redis connection manager.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
    op_timeout: Duration,
}

impl RedisCache {
    /// Connect to `url` (e.g. `redis://127.0.0.1:6379`).
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(url).map_err(|e| {
            error!(error = %e, "invalid redis url");
            CacheError::Unavailable(e.to_string())
        })?;
        let conn = ConnectionManager::new(client).await.map_err(|e| {
            error!(error = %e, "redis connect failed");
            CacheError::Unavailable(e.to_string())
        })?;
        info!("connected to redis");
        Ok(Self {
            conn,
            op_timeout: DEFAULT_OP_TIMEOUT,
        })
    }

    pub fn with_op_timeout(mut self, op_timeout: Duration) -> Self {
        self.op_timeout = op_timeout;
        self
    }

    async fn run<T, F>(&self, op: &'static str, key: &str, fut: F) -> Result<T, CacheError>
    where
        F: std::future::Future<Output = redis::RedisResult<T>>,
    {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(Ok(v)) => Ok(v),
            Ok(Err(e)) => {
                error!(op, key, error = %e, "redis command failed");
                Err(CacheError::Unavailable(e.to_string()))
            }
            Err(_) => {
                error!(op, key, "redis command timed out");
                Err(CacheError::Timeout)
            }
        }
    }
}

#[async_trait]
impl SessionCache for RedisCache {
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        // SETEX rejects a zero TTL.
        let secs = ttl.as_secs().max(1);
        self.run("put", key, conn.set_ex::<_, _, ()>(key, value, secs))
            .await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        self.run("get", key, conn.get::<_, Option<String>>(key)).await
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        self.run("delete", key, conn.del::<_, ()>(key)).await
    }
}
