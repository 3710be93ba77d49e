//! Access-token middleware and bearer header parsing.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use ticketgate_core::auth::jwt::TokenService;
use ticketgate_core::models::actor::ActorType;
use ticketgate_core::models::auth::ActorClaims;

use crate::error::AppError;

/// Header carrying `Bearer <refresh token>` on refresh calls.
pub const REFRESH_HEADER: &str = "x-refresh-token";

/// Verified access-token claims, stored in request extensions.
#[derive(Debug, Clone)]
pub struct AuthenticatedActor(pub ActorClaims);

/// Middleware state: which actor type's access secret guards the routes.
#[derive(Clone)]
pub struct AccessGate {
    pub tokens: TokenService,
    pub actor_type: ActorType,
}

/// Pull the token out of a `Bearer <token>` header value.
pub fn bearer<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Axum middleware: verifies `Authorization: Bearer <access>` against the
/// gate's actor type and injects [`AuthenticatedActor`]. No cache lookup.
pub async fn require_access(
    State(gate): State<AccessGate>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer(request.headers(), AUTHORIZATION.as_str())
        .ok_or_else(|| AppError::token(StatusCode::UNAUTHORIZED))?;

    let claims = gate
        .tokens
        .verify_access(token, gate.actor_type)
        .map_err(AppError::from)?;
    debug!(actor_id = %claims.id, actor_type = %gate.actor_type, "access granted");

    request.extensions_mut().insert(AuthenticatedActor(claims));
    Ok(next.run(request).await)
}
