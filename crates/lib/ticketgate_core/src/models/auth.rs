//! Token and OTP models.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::actor::ActorType;

/// Claims embedded in both access and refresh tokens.
///
/// Access tokens carry `type`; refresh tokens leave it out and the caller
/// supplies the actor type on verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorClaims {
    /// Actor ID.
    pub id: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub actor_type: Option<ActorType>,
    /// Expiry (unix timestamp).
    pub exp: i64,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Unique token ID; keeps two tokens minted in the same second distinct.
    pub jti: String,
    /// Remaining serialized actor fields (email, verified, profile...).
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Freshly issued access/refresh pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

/// Successful email OTP verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailOtpVerification {
    pub email: String,
    pub code: String,
    pub status: bool,
}

/// Challenge created by the SMS provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneOtpChallenge {
    pub code: String,
    pub verification_id: String,
}

/// Successful phone OTP verification as reported by the SMS provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneOtpVerification {
    pub code: String,
    pub phone: String,
}
