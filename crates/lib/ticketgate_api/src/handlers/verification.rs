//! Verification gate and password recovery handlers.

use axum::extract::State;
use axum::{Extension, Json};

use ticketgate_core::auth::AuthError;
use ticketgate_core::models::actor::{ActorRecord, ActorType};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthenticatedActor;
use crate::models::{AppJson, ForgotPasswordRequest, SuccessResponse, VerifyRequest};

/// `POST /{actors}/verify`: record the channel the caller has proven.
///
/// The OTP (or wallet/document) check is the client's prior step; this
/// endpoint only requires a valid access token.
pub async fn verify_handler(
    State(state): State<AppState>,
    Extension(actor_type): Extension<ActorType>,
    Extension(AuthenticatedActor(claims)): Extension<AuthenticatedActor>,
    AppJson(body): AppJson<VerifyRequest>,
) -> AppResult<Json<ActorRecord>> {
    let actor = state
        .auth
        .apply_verification(actor_type, &claims.id, &body.channel)
        .await
        .map_err(|e| match e {
            AuthError::InvalidVerificationKey(_) => AppError::validation("channel", e.to_string()),
            other => other.into(),
        })?;
    Ok(Json(actor))
}

/// `POST /{actors}/forgot-password`: reset through the verified channel.
pub async fn forgot_password_handler(
    State(state): State<AppState>,
    Extension(actor_type): Extension<ActorType>,
    AppJson(body): AppJson<ForgotPasswordRequest>,
) -> AppResult<Json<SuccessResponse>> {
    state
        .auth
        .forgot_password(&body.key, &body.value, &body.password, actor_type)
        .await?;
    Ok(Json(SuccessResponse::ok()))
}
