use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};

use crate::AppState;

/// Health check endpoint. Reports 503 when the store stops answering.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let healthy = state.db.health_check().await;
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "status": if healthy { "ok" } else { "degraded" },
            "timestamp": Utc::now().to_rfc3339(),
        })),
    )
}
