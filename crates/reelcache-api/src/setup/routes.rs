//! Route configuration

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the application router.
pub fn setup_routes(state: Arc<AppState>) -> Router {
    // The service sits behind browser clients the operator does not
    // control, so CORS stays wide open.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health::liveness_check))
        .route("/health/ready", get(handlers::health::readiness_check))
        .route("/api/v0/reels/fetch", post(handlers::reels::fetch_reel))
        .route("/api/v0/reels/{reel_id}", get(handlers::reels::get_reel))
        .route(
            "/api/v0/reels/{reel_id}/video-url",
            get(handlers::reels::get_reel_video_url),
        )
        .route("/api/v0/reels", delete(handlers::reels::delete_reel))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
