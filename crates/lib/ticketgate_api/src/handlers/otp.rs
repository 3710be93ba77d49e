//! One-time code handlers. Codes are never echoed back on request.

use axum::Json;
use axum::extract::State;

use ticketgate_core::models::auth::{EmailOtpVerification, PhoneOtpVerification};
use ticketgate_core::otp::PhoneOtpClient;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{
    AppJson, EmailOtpRequest, EmailOtpVerifyRequest, OtpSentResponse, PhoneOtpRequest,
    PhoneOtpResponse, PhoneOtpVerifyRequest,
};

fn phone_client(state: &AppState) -> AppResult<&PhoneOtpClient> {
    state
        .phone_otp
        .as_ref()
        .ok_or_else(|| AppError::Unavailable("Phone verification is not configured".into()))
}

/// `POST /otp/email`: mail a 6-digit code.
pub async fn request_email_otp_handler(
    State(state): State<AppState>,
    AppJson(body): AppJson<EmailOtpRequest>,
) -> AppResult<Json<OtpSentResponse>> {
    state.email_otp.request_email_otp(&body.email).await?;
    Ok(Json(OtpSentResponse { sent: true }))
}

/// `POST /otp/email/verify`: consume a mailed code.
pub async fn verify_email_otp_handler(
    State(state): State<AppState>,
    AppJson(body): AppJson<EmailOtpVerifyRequest>,
) -> AppResult<Json<EmailOtpVerification>> {
    let verified = state
        .email_otp
        .verify_email_otp(&body.email, &body.code)
        .await?;
    Ok(Json(verified))
}

/// `POST /otp/phone`: ask the SMS provider for a challenge.
pub async fn request_phone_otp_handler(
    State(state): State<AppState>,
    AppJson(body): AppJson<PhoneOtpRequest>,
) -> AppResult<Json<PhoneOtpResponse>> {
    let challenge = phone_client(&state)?
        .request_phone_otp(&body.phone, body.length)
        .await?;
    Ok(Json(PhoneOtpResponse {
        verification_id: challenge.verification_id,
    }))
}

/// `POST /otp/phone/verify`: check a texted code with the provider.
pub async fn verify_phone_otp_handler(
    State(state): State<AppState>,
    AppJson(body): AppJson<PhoneOtpVerifyRequest>,
) -> AppResult<Json<PhoneOtpVerification>> {
    let verified = phone_client(&state)?
        .verify_phone_otp(&body.phone, &body.code, &body.verification_id)
        .await?;
    Ok(Json(verified))
}
