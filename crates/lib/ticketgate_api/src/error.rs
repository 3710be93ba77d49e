//! Application error types.
//!
//! Every failure leaves the service as `{msg, statusCode, type, attr?}`.

use axum::extract::rejection::JsonRejection;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use ticketgate_core::auth::{AuthError, NO_VALID_TOKEN};

use crate::models::ErrorResponse;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{msg}")]
    Validation { attr: Option<String>, msg: String },

    /// Merged token failure class. Status depends on the call site.
    #[error("{msg}")]
    Token { status: StatusCode, msg: String },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{msg}")]
    Otp { status: StatusCode, msg: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal server error")]
    Internal(String),
}

impl AppError {
    pub fn validation(attr: impl Into<String>, msg: impl Into<String>) -> Self {
        AppError::Validation {
            attr: Some(attr.into()),
            msg: msg.into(),
        }
    }

    pub fn token(status: StatusCode) -> Self {
        AppError::Token {
            status,
            msg: NO_VALID_TOKEN.to_string(),
        }
    }

    /// Re-home a client-caused token failure onto `status`. Server-side
    /// token failures (missing secrets) keep their 500.
    pub fn with_token_status(self, status: StatusCode) -> Self {
        match self {
            AppError::Token { status: old, msg } if old.is_client_error() => {
                AppError::Token { status, msg }
            }
            other => other,
        }
    }

    fn parts(&self) -> (StatusCode, &'static str, String, Option<&str>) {
        match self {
            AppError::Validation { attr, msg } => (
                StatusCode::BAD_REQUEST,
                "validation",
                msg.clone(),
                attr.as_deref(),
            ),
            AppError::Token { status, msg } => (*status, "token", msg.clone(), None),
            AppError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, "auth", m.clone(), None),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, "not_found", m.clone(), None),
            AppError::Otp { status, msg } => (*status, "otp", msg.clone(), None),
            AppError::Conflict(m) => (StatusCode::CONFLICT, "conflict", m.clone(), None),
            AppError::Unavailable(m) => {
                (StatusCode::SERVICE_UNAVAILABLE, "unavailable", m.clone(), None)
            }
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal",
                "Internal server error".to_string(),
                None,
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Internal(detail) = &self {
            error!(%detail, "internal error");
        }
        let (status, kind, msg, attr) = self.parts();
        let body = Json(ErrorResponse {
            msg,
            status_code: status.as_u16(),
            kind: kind.to_string(),
            attr: attr.map(str::to_string),
        });
        (status, body).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Configuration(detail) => {
                error!(%detail, "token configuration error");
                AppError::token(StatusCode::INTERNAL_SERVER_ERROR)
            }
            e @ (AuthError::MalformedToken | AuthError::InvalidToken { .. }) => AppError::Token {
                status: StatusCode::UNAUTHORIZED,
                msg: e.to_string(),
            },
            AuthError::Cache(e) => {
                error!(error = %e, "session cache failure");
                AppError::Unavailable("Session store unavailable".into())
            }
            e @ (AuthError::OtpNotFound | AuthError::OtpMismatch) => AppError::Otp {
                status: StatusCode::NOT_FOUND,
                msg: e.to_string(),
            },
            AuthError::OtpDelivery(detail) => {
                error!(%detail, "otp delivery failed");
                AppError::Otp {
                    status: StatusCode::BAD_GATEWAY,
                    msg: "Could not deliver verification code".into(),
                }
            }
            e @ AuthError::InvalidVerificationKey(_) => AppError::validation("key", e.to_string()),
            AuthError::ActorNotFound => AppError::NotFound("Actor not found".into()),
            AuthError::Validation { attr, msg } => AppError::Validation {
                attr: Some(attr),
                msg,
            },
            AuthError::CredentialError => AppError::Unauthorized("Invalid credentials".into()),
            AuthError::Conflict(m) => AppError::Conflict(m),
            AuthError::DbError(e) => AppError::Internal(e.to_string()),
            AuthError::Internal(m) => AppError::Internal(m),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        let msg = rejection.body_text();
        // serde names the field in backticks: "missing field `email`".
        let attr = msg
            .split('`')
            .nth(1)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        AppError::Validation { attr, msg }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_errors_default_to_401() {
        let err = AppError::from(AuthError::InvalidToken { cache: true });
        let (status, kind, msg, _) = err.parts();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(kind, "token");
        assert_eq!(msg, "No Valid Token [Cache]");
    }

    #[test]
    fn call_site_can_move_token_status() {
        let err = AppError::from(AuthError::MalformedToken).with_token_status(StatusCode::BAD_REQUEST);
        assert_eq!(err.parts().0, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn configuration_error_stays_server_side() {
        let err = AppError::from(AuthError::Configuration("USER_ACCESS_SECRET is not set".into()))
            .with_token_status(StatusCode::BAD_REQUEST);
        let (status, kind, msg, _) = err.parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(kind, "token");
        assert_eq!(msg, "No Valid Token");
    }

    #[test]
    fn validation_carries_attr() {
        let err = AppError::from(AuthError::validation("password", "too short"));
        let (status, _, _, attr) = err.parts();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(attr, Some("password"));
    }

    #[test]
    fn otp_failures_are_404() {
        for e in [AuthError::OtpNotFound, AuthError::OtpMismatch] {
            assert_eq!(AppError::from(e).parts().0, StatusCode::NOT_FOUND);
        }
    }
}
