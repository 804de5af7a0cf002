use crate::state::AppState;
use axum::Router;
use axum::routing::{get, post};
use std::sync::Arc;

pub mod handlers;
pub mod responses;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/route/safety", post(handlers::post_route_safety))
        .route("/api/departure", post(handlers::post_departure))
        .route("/api/crashes/stats", get(handlers::get_crash_stats))
        .route("/api/health", get(handlers::get_health))
        .with_state(state)
}
