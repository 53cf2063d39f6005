//! # Error Handling
//!
//! Closed set of error kinds for the ceremony server, plus the conversion
//! into HTTP responses.
//!
//! Two rules shape this module:
//! - A structurally valid but cryptographically failed authenticator response
//!   is a `{verified: false}` *result*, never an error.
//! - Every error that does escape a handler maps to a uniform 400 with a
//!   `{"error": message}` body, so clients restart the ceremony rather than
//!   branching on status codes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::ledger::CeremonyScope;

/// Application-wide error type.
///
/// The first five variants are the ceremony-level failures callers can act
/// on; the rest wrap infrastructure faults (I/O, serialization, the webauthn
/// backend) that are logged in detail and surfaced generically.
#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed identity or missing required request fields. Raised before
    /// any store access happens.
    #[error("{0}")]
    Validation(String),

    /// No outstanding challenge for the (user, rp id, scope) key: the
    /// ceremony was never started, already consumed, or expired. The client
    /// must restart from options generation.
    #[error("no outstanding {0} challenge; restart the ceremony")]
    ChallengeNotFound(CeremonyScope),

    /// The user record disappeared between challenge issuance and
    /// verification.
    #[error("user '{0}' not found")]
    UserNotFound(String),

    /// Authentication options were requested for a user with no registered
    /// passkeys.
    #[error("no passkey registered for user '{0}'")]
    NoCredentialsRegistered(String),

    /// The assertion names a credential id that is not among the user's
    /// registered credentials.
    #[error("no matching passkey for credential '{0}'")]
    CredentialMismatch(String),

    /// Store I/O failures.
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// JSON (de)serialization failures, both on the wire and in the store
    /// document.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Errors from the webauthn backend behind the verifier port.
    #[error("webauthn error: {0}")]
    WebAuthn(#[from] webauthn_rs::prelude::WebauthnError),

    /// Verifier port failures that are not backend errors (malformed options
    /// payload, unusable stored credential material).
    #[error("verifier error: {0}")]
    Verifier(String),

    /// Anything that should not normally occur.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Convert `AppError` into an HTTP response.
///
/// Ceremony-level kinds carry messages that are safe to show to clients.
/// Infrastructure kinds log the detailed error server-side and return a
/// generic message instead.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self {
            AppError::Validation(_)
            | AppError::ChallengeNotFound(_)
            | AppError::UserNotFound(_)
            | AppError::NoCredentialsRegistered(_)
            | AppError::CredentialMismatch(_) => self.to_string(),
            AppError::Storage(e) => {
                tracing::error!(error = %e, "storage error");
                "storage error".to_string()
            }
            AppError::Serialization(e) => {
                tracing::error!(error = %e, "serialization error");
                "serialization error".to_string()
            }
            AppError::WebAuthn(e) => {
                tracing::error!(error = %e, "webauthn error");
                "authentication error".to_string()
            }
            AppError::Verifier(e) => {
                tracing::error!(error = %e, "verifier error");
                "authentication error".to_string()
            }
            AppError::Internal(e) => {
                tracing::error!(error = %e, "internal error");
                "internal error".to_string()
            }
        };

        let body = Json(json!({
            "error": message,
        }));

        (StatusCode::BAD_REQUEST, body).into_response()
    }
}

/// Convenience alias used throughout the crate.
pub type AppResult<T> = Result<T, AppError>;
