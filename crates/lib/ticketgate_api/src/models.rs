//! Request and response bodies for the HTTP surface.
//!
//! All bodies use camelCase on the wire.

use axum::extract::FromRequest;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use ticketgate_core::models::actor::{ActorRecord, NewActor};
use ticketgate_core::models::auth::TokenPair;

use crate::error::AppError;

/// JSON extractor whose rejections render as [`ErrorResponse`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Uniform error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub msg: String,
    pub status_code: u16,
    #[serde(rename = "type")]
    pub kind: String,
    /// Offending input field, for validation failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attr: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub wallet: Option<String>,
    pub document: Option<String>,
    /// Any other profile fields (name, avatar, company...).
    #[serde(flatten)]
    pub profile: Map<String, Value>,
}

impl From<SignupRequest> for NewActor {
    fn from(req: SignupRequest) -> Self {
        NewActor {
            email: req.email,
            password: req.password,
            phone: req.phone,
            wallet: req.wallet,
            document: req.document,
            profile: req.profile,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Token issuance response. `actor` is present on signup and login.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor: Option<ActorRecord>,
}

impl TokenResponse {
    pub fn new(pair: TokenPair, actor: Option<ActorRecord>) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            token_type: "Bearer",
            expires_in: pair.expires_in,
            actor,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyRequest {
    pub channel: String,
}

/// Password recovery: `key` names the identifier (`email` or `phone`).
#[derive(Debug, Clone, Deserialize)]
pub struct ForgotPasswordRequest {
    pub key: String,
    pub value: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailOtpRequest {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailOtpVerifyRequest {
    pub email: String,
    pub code: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PhoneOtpRequest {
    pub phone: String,
    /// Code length, 4 to 10 digits.
    #[serde(default = "default_phone_otp_length")]
    pub length: u8,
}

fn default_phone_otp_length() -> u8 {
    6
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneOtpResponse {
    pub verification_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneOtpVerifyRequest {
    pub phone: String,
    pub code: String,
    pub verification_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OtpSentResponse {
    pub sent: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}
