use super::state::AppState;
use crate::error::RoomError;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Serialize;
use tracing::debug;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub active_rooms: usize,
    pub active_sessions: usize,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub error: String,
}

impl From<&RoomError> for ErrorResponse {
    fn from(e: &RoomError) -> Self {
        Self {
            code: e.code().to_string(),
            error: e.to_string(),
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /stats
/// Active room and session counts
pub async fn get_stats(State(state): State<AppState>) -> impl IntoResponse {
    let stats = state.rooms.stats().await;

    (
        StatusCode::OK,
        Json(StatsResponse {
            active_rooms: stats.active_rooms,
            active_sessions: stats.active_sessions,
        }),
    )
}

/// GET /rooms/:room_id
/// Read-only snapshot of one room
pub async fn get_room(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> impl IntoResponse {
    match state.rooms.snapshot(&room_id).await {
        Ok(snapshot) => (StatusCode::OK, Json(snapshot)).into_response(),
        Err(e) => {
            debug!("Room lookup failed: {}", e);
            let status = match e {
                RoomError::RoomNotFound(_) => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, Json(ErrorResponse::from(&e))).into_response()
        }
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
