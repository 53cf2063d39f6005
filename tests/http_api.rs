//! Router-level tests: request parsing, context resolution from headers,
//! and the uniform `{"error": message}` 400 mapping.

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use common::MockVerifier;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use passkey_rp::ceremony::CeremonyOrchestrator;
use passkey_rp::config::RelyingPartyConfig;
use passkey_rp::handlers;
use passkey_rp::ledger::{ChallengeLedger, InMemoryChallengeLedger};
use passkey_rp::state::AppState;
use passkey_rp::store::MemoryStore;

fn test_app() -> Router {
    let relying_party = RelyingPartyConfig {
        rp_id: Some("localhost".to_string()),
        rp_name: Some("Test RP".to_string()),
        origin: Some("http://localhost:8080".to_string()),
    };
    let store = Arc::new(MemoryStore::new());
    let ledger: Arc<dyn ChallengeLedger> = Arc::new(InMemoryChallengeLedger::new(None));
    let verifier = Arc::new(MockVerifier::new());
    let ceremonies = Arc::new(CeremonyOrchestrator::new(
        store,
        ledger.clone(),
        verifier,
        relying_party.clone(),
    ));

    handlers::router(AppState {
        ceremonies,
        relying_party,
        ledger,
    })
}

fn post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_check_responds() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn registration_options_return_the_challenge_payload() {
    let app = test_app();

    let response = app
        .oneshot(post("/api/register/options", r#"{"userId": "alice"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["challenge"], "registration-challenge");
    assert_eq!(body["rp"]["id"], "localhost");
}

#[tokio::test]
async fn missing_user_id_maps_to_400() {
    let app = test_app();

    let response = app
        .oneshot(post("/api/register/options", "{}"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "userId is required");
}

#[tokio::test]
async fn missing_attestation_response_maps_to_400() {
    let app = test_app();

    let response = app
        .oneshot(post("/api/register/verify", r#"{"userId": "alice"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "attestationResponse is required");
}

#[tokio::test]
async fn invalid_identity_maps_to_400() {
    let app = test_app();

    let response = app
        .oneshot(post("/api/register/options", r#"{"userId": "a!"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("user id"));
}

#[tokio::test]
async fn stale_verify_tells_the_client_to_restart() {
    let app = test_app();

    let response = app
        .oneshot(post(
            "/api/login/verify",
            r#"{"userId": "alice", "authenticationResponse": {"id": "c1"}}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("restart the ceremony"));
}

#[tokio::test]
async fn login_options_for_unknown_user_maps_to_400() {
    let app = test_app();

    let response = app
        .oneshot(post("/api/login/options", r#"{"userId": "ghost"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "no passkey registered for user 'ghost'");
}
