pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::ranking::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.config.max_upload_bytes);

    Router::new()
        .route("/health", get(health::health_handler))
        // Ranking API
        .route("/rank", post(handlers::handle_rank_upload))
        .route("/api/v1/rank", post(handlers::handle_rank_upload))
        .route("/api/v1/rank/text", post(handlers::handle_rank_text))
        .route(
            "/api/v1/rank/report.csv",
            post(handlers::handle_rank_report),
        )
        .layer(body_limit)
        .with_state(state)
}
