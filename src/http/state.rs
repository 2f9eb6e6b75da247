use std::sync::Arc;

use crate::gateway::Gateway;
use crate::room::{RoomRegistry, RoomSettings};
use crate::session::SessionRegistry;
use crate::translation::Translator;

/// Shared application state for HTTP and WebSocket handlers
#[derive(Clone)]
pub struct AppState {
    /// Live connections (session_id → session)
    pub sessions: Arc<SessionRegistry>,

    /// Rooms and their participants (room_id → room)
    pub rooms: Arc<RoomRegistry>,

    pub gateway: Arc<Gateway>,
}

impl AppState {
    pub fn new(room_settings: RoomSettings, translator: Arc<Translator>) -> Self {
        let sessions = Arc::new(SessionRegistry::new());
        let rooms = Arc::new(RoomRegistry::new(Arc::clone(&sessions), room_settings));
        let gateway = Arc::new(Gateway::new(Arc::clone(&rooms), translator));

        Self {
            sessions,
            rooms,
            gateway,
        }
    }

    /// Tear down every room and session
    pub async fn shutdown(&self) {
        self.rooms.shutdown().await;
    }
}
