//! HTTP server: WebSocket gateway plus read-only introspection
//!
//! - GET /ws - Real-time event channel (see `gateway`)
//! - GET /stats - Active room and session counts
//! - GET /rooms/:room_id - Room snapshot
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use handlers::{ErrorResponse, StatsResponse};
pub use routes::create_router;
pub use state::AppState;
