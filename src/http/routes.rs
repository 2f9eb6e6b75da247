use super::handlers;
use super::state::AppState;
use crate::gateway::ws_handler;
use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Real-time gateway
        .route("/ws", get(ws_handler))
        // Introspection
        .route("/stats", get(handlers::get_stats))
        .route("/rooms/:room_id", get(handlers::get_room))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
