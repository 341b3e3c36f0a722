use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers::{api, tts};
use crate::state::AppState;
use std::sync::Arc;

/// Assemble the synthesis service router.
pub fn create_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(api::root))
        .route("/health", get(api::health_check))
        .route("/tts/models/info", get(api::model_info))
        .route("/tts/synthesize", post(tts::synthesize))
        .route("/tts/synthesize_async", post(tts::synthesize_async))
        .route("/tts/status/{job_id}", get(tts::job_status))
        .layer(TraceLayer::new_for_http())
}
