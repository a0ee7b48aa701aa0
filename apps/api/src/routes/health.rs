use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns a status object with service version and the active ranking strategies.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "ranker",
        "vectorizer": state.ranker.vectorizer_kind(),
        "scorer": state.ranker.scorer_backend(),
    }))
}
