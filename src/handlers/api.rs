//! Service-level endpoints: banner, liveness, model metadata.

use std::sync::Arc;

use axum::{Json, extract::State};
use serde_json::{Value, json};

use crate::state::AppState;

/// Root banner.
pub async fn root() -> Json<Value> {
    Json(json!({
        "service": "voxloop synthesis service",
        "status": "running"
    }))
}

/// Liveness probe. No deep check: a served response means the broker's
/// tasks were started.
pub async fn health_check() -> Json<Value> {
    Json(json!({ "ok": true }))
}

/// Metadata of the engine behind the broker.
pub async fn model_info(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!(state.broker.model_info()))
}
