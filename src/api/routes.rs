use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::api::{handlers, state::AppState, websocket::websocket_handler};

pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health_handler))
        // Read endpoints
        .route("/api/leaderboard", get(handlers::get_leaderboard))
        .route("/api/leaderboard/contest", get(handlers::get_contest_leaderboard))
        .route("/api/leaderboard/window", get(handlers::get_window_leaderboard))
        .route("/api/leaderboard/meta", get(handlers::get_leaderboard_meta))
        // Admin endpoints
        .route("/api/admin/window", post(handlers::set_contest_window))
        .route("/api/admin/countdown", post(handlers::set_countdown))
        .route("/api/admin/refresh", post(handlers::force_refresh))
        // WebSocket endpoint
        .route("/ws", get(websocket_handler))
        // Add state and CORS
        .with_state(state)
        .layer(cors)
}
