//! Authentication and session lifecycle.
//!
//! Token issuance and verification, password hashing, sign-up/login/refresh
//! flows, and the verification gate that controls password recovery. Shared
//! by every actor type; the [`ActorType`](crate::models::actor::ActorType)
//! tag selects secrets and stores.

pub mod jwt;
pub mod password;
pub mod secrets;
pub mod session;
pub mod verification;

#[cfg(test)]
pub(crate) mod test_support;

use thiserror::Error;

use crate::cache::CacheError;

/// Generic message for every token failure reaching a client.
pub const NO_VALID_TOKEN: &str = "No Valid Token";

/// Token failure caused by the session cache check.
pub const NO_VALID_TOKEN_CACHE: &str = "No Valid Token [Cache]";

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// A signing secret is not configured.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("No Valid Token")]
    MalformedToken,

    /// Signature, expiry or session-cache mismatch. `cache` marks the latter.
    #[error("{}", token_message(.cache))]
    InvalidToken { cache: bool },

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("OTP not found or expired")]
    OtpNotFound,

    #[error("OTP does not match")]
    OtpMismatch,

    #[error("OTP delivery failed: {0}")]
    OtpDelivery(String),

    #[error("Invalid verification key: {0}")]
    InvalidVerificationKey(String),

    #[error("Actor not found")]
    ActorNotFound,

    #[error("{msg}")]
    Validation { attr: String, msg: String },

    #[error("Invalid credentials")]
    CredentialError,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    DbError(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

fn token_message(cache: &bool) -> &'static str {
    if *cache {
        NO_VALID_TOKEN_CACHE
    } else {
        NO_VALID_TOKEN
    }
}

impl AuthError {
    pub fn validation(attr: impl Into<String>, msg: impl Into<String>) -> Self {
        AuthError::Validation {
            attr: attr.into(),
            msg: msg.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_errors_share_one_message() {
        assert_eq!(AuthError::MalformedToken.to_string(), "No Valid Token");
        assert_eq!(
            AuthError::InvalidToken { cache: false }.to_string(),
            "No Valid Token"
        );
        assert_eq!(
            AuthError::InvalidToken { cache: true }.to_string(),
            "No Valid Token [Cache]"
        );
    }
}
