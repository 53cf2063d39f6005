//! Liveness probe for load balancers and monitoring.

use axum::Json;
use serde_json::{json, Value};

/// Always returns 200 with a static body; this handler cannot fail.
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "passkey-rp"
    }))
}
