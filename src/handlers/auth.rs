//! Ceremony endpoints. Request bodies carry optional fields so a missing
//! `userId` surfaces as the uniform validation error rather than an opaque
//! extractor rejection; the context is resolved from the `Origin` and
//! `Host` headers on every route.

use axum::{
    extract::State,
    http::{header, HeaderMap},
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::ceremony::{AuthenticationOutcome, RegistrationOutcome};
use crate::context::{resolve_context, PasskeyContext};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionsRequestBody {
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterVerifyRequestBody {
    pub user_id: Option<String>,
    /// The credential from `navigator.credentials.create()`, passed through
    /// to the verifier as raw JSON.
    pub attestation_response: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginVerifyRequestBody {
    pub user_id: Option<String>,
    /// The assertion from `navigator.credentials.get()`.
    pub authentication_response: Option<Value>,
}

fn request_context(state: &AppState, headers: &HeaderMap) -> PasskeyContext {
    let origin = headers.get(header::ORIGIN).and_then(|v| v.to_str().ok());
    let host = headers.get(header::HOST).and_then(|v| v.to_str().ok());
    resolve_context(&state.relying_party, origin, host)
}

fn required<T>(field: Option<T>, name: &str) -> AppResult<T> {
    field.ok_or_else(|| AppError::Validation(format!("{name} is required")))
}

pub async fn register_options(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<OptionsRequestBody>,
) -> AppResult<Json<Value>> {
    let user_id = required(body.user_id, "userId")?;
    let context = request_context(&state, &headers);

    let options = state.ceremonies.registration_options(&user_id, &context).await?;
    Ok(Json(options))
}

pub async fn register_verify(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<RegisterVerifyRequestBody>,
) -> AppResult<Json<RegistrationOutcome>> {
    let user_id = required(body.user_id, "userId")?;
    let response = required(body.attestation_response, "attestationResponse")?;
    let context = request_context(&state, &headers);

    let outcome = state
        .ceremonies
        .verify_registration(&user_id, &response, &context)
        .await?;
    Ok(Json(outcome))
}

pub async fn login_options(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<OptionsRequestBody>,
) -> AppResult<Json<Value>> {
    let user_id = required(body.user_id, "userId")?;
    let context = request_context(&state, &headers);

    let options = state
        .ceremonies
        .authentication_options(&user_id, &context)
        .await?;
    Ok(Json(options))
}

pub async fn login_verify(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<LoginVerifyRequestBody>,
) -> AppResult<Json<AuthenticationOutcome>> {
    let user_id = required(body.user_id, "userId")?;
    let response = required(body.authentication_response, "authenticationResponse")?;
    let context = request_context(&state, &headers);

    let outcome = state
        .ceremonies
        .verify_authentication(&user_id, &response, &context)
        .await?;
    Ok(Json(outcome))
}
