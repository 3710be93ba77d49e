//! Session cache: TTL key-value storage for refresh tokens and OTP codes.
//!
//! Components receive an `Arc<dyn SessionCache>`; nothing reaches for a
//! global client. There is no compare-and-swap: callers that need a slot
//! replaced do a delete followed by a put.

pub mod memory;
pub mod remote;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use memory::MemoryCache;
pub use remote::RedisCache;

/// Cache backend failures. Callers treat these the same as a missing key
/// wherever a session check depends on the cache.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache unavailable: {0}")]
    Unavailable(String),

    #[error("Cache operation timed out")]
    Timeout,
}

/// TTL-capable key-value store.
#[async_trait]
pub trait SessionCache: Send + Sync {
    /// Store `value` under `key`, replacing any prior value, expiring after `ttl`.
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Fetch the live value for `key`.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Remove `key`. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}
