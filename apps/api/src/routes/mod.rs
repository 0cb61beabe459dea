pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::intake::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    // Leave headroom above the file cap for the other multipart parts.
    let body_limit = state.config.max_upload_bytes + 64 * 1024;

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/resumes/upload", post(handlers::handle_upload))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
