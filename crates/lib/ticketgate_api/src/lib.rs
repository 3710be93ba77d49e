//! # ticketgate_api
//!
//! HTTP API library for Ticketgate: user and organizer auth routes plus the
//! shared OTP routes.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;

use axum::routing::{get, post};
use axum::{Extension, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use ticketgate_core::auth::session::AuthService;
use ticketgate_core::models::actor::ActorType;
use ticketgate_core::otp::{EmailOtpService, PhoneOtpClient};

use crate::handlers::{auth, otp, verification};
use crate::middleware::auth::{AccessGate, require_access};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub email_otp: EmailOtpService,
    /// `None` when no SMS provider is configured.
    pub phone_otp: Option<PhoneOtpClient>,
}

/// Routes for one actor type, mounted under its prefix.
fn actor_routes(actor_type: ActorType, state: &AppState) -> Router<AppState> {
    let gate = AccessGate {
        tokens: state.auth.tokens().clone(),
        actor_type,
    };

    let public = Router::new()
        .route("/signup", post(auth::signup_handler))
        .route("/login", post(auth::login_handler))
        .route("/refresh", post(auth::refresh_handler))
        .route(
            "/forgot-password",
            post(verification::forgot_password_handler),
        );

    let protected = Router::new()
        .route("/logout", post(auth::logout_handler))
        .route("/me", get(auth::me_handler))
        .route("/verify", post(verification::verify_handler))
        .route_layer(axum::middleware::from_fn_with_state(gate, require_access));

    public.merge(protected).layer(Extension(actor_type))
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let otp_routes = Router::new()
        .route("/email", post(otp::request_email_otp_handler))
        .route("/email/verify", post(otp::verify_email_otp_handler))
        .route("/phone", post(otp::request_phone_otp_handler))
        .route("/phone/verify", post(otp::verify_phone_otp_handler));

    Router::new()
        .nest("/users", actor_routes(ActorType::User, &state))
        .nest("/organizers", actor_routes(ActorType::Organizer, &state))
        .nest("/otp", otp_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
