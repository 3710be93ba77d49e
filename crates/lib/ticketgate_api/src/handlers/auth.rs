//! Sign-up, login, refresh, logout and `me` handlers.
//!
//! Every handler serves both actor types; the router supplies the type as an
//! [`Extension`].

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::{Extension, Json};

use ticketgate_core::models::actor::ActorType;
use ticketgate_core::models::auth::ActorClaims;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::{AuthenticatedActor, REFRESH_HEADER, bearer};
use crate::models::{AppJson, LoginRequest, SignupRequest, SuccessResponse, TokenResponse};

/// `POST /{actors}/signup`: create an unverified actor and log it in.
pub async fn signup_handler(
    State(state): State<AppState>,
    Extension(actor_type): Extension<ActorType>,
    AppJson(body): AppJson<SignupRequest>,
) -> AppResult<(StatusCode, Json<TokenResponse>)> {
    let (actor, pair) = state.auth.register(actor_type, body.into()).await?;
    Ok((StatusCode::CREATED, Json(TokenResponse::new(pair, Some(actor)))))
}

/// `POST /{actors}/login`: email + password.
pub async fn login_handler(
    State(state): State<AppState>,
    Extension(actor_type): Extension<ActorType>,
    AppJson(body): AppJson<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    let (actor, pair) = state
        .auth
        .login(actor_type, &body.email, &body.password)
        .await?;
    Ok(Json(TokenResponse::new(pair, Some(actor))))
}

/// `POST /{actors}/refresh`: rotate the pair using the refresh header.
///
/// Token failures here are the caller's fault and answer 400.
pub async fn refresh_handler(
    State(state): State<AppState>,
    Extension(actor_type): Extension<ActorType>,
    headers: HeaderMap,
) -> AppResult<Json<TokenResponse>> {
    let token = bearer(&headers, REFRESH_HEADER)
        .ok_or_else(|| AppError::token(StatusCode::BAD_REQUEST))?;
    let pair = state
        .auth
        .refresh(actor_type, token)
        .await
        .map_err(|e| AppError::from(e).with_token_status(StatusCode::BAD_REQUEST))?;
    Ok(Json(TokenResponse::new(pair, None)))
}

/// `POST /{actors}/logout`: drop the live session. Requires an access token.
pub async fn logout_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedActor(claims)): Extension<AuthenticatedActor>,
) -> AppResult<Json<SuccessResponse>> {
    state.auth.logout(&claims.id).await?;
    Ok(Json(SuccessResponse::ok()))
}

/// `GET /{actors}/me`: the claims of the presented access token.
pub async fn me_handler(
    Extension(AuthenticatedActor(claims)): Extension<AuthenticatedActor>,
) -> Json<ActorClaims> {
    Json(claims)
}
