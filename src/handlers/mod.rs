//! # HTTP Request Handlers
//!
//! Route handlers for the ceremony endpoints and the health probe, plus the
//! router that wires them up. Handlers stay thin: extract the body, resolve
//! the request context from headers, call the orchestrator, and let
//! `AppError`'s `IntoResponse` turn failures into the uniform
//! `{"error": message}` 400 body.

pub mod auth;
pub mod health;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the application router.
pub fn router(state: AppState) -> Router {
    // Permissive CORS keeps browser frontends on other origins working in
    // development; restrict to specific origins in production.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health_check))
        // Registration ceremony
        .route("/api/register/options", post(auth::register_options))
        .route("/api/register/verify", post(auth::register_verify))
        // Authentication ceremony
        .route("/api/login/options", post(auth::login_options))
        .route("/api/login/verify", post(auth::login_verify))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
