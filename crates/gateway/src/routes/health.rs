//! Liveness endpoint.
//!
//! Reports gateway liveness only; backend reachability surfaces through
//! the per-request error mapping instead.

use axum::Json;

/// GET /manage/health — reports the gateway process is serving.
pub async fn check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
