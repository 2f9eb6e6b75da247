use std::collections::HashMap;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info};

use super::session::{Session, SessionId};
use crate::error::RoomError;
use crate::gateway::ServerEvent;

/// Owned store of live sessions (session_id → session)
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection.
    ///
    /// Returns the session together with the receiving half of its outbox;
    /// the transport drains the receiver and writes events to the wire.
    pub async fn connect(
        &self,
        user_id: Option<String>,
    ) -> (Session, mpsc::UnboundedReceiver<ServerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let session = Session::new(user_id, tx);

        self.sessions
            .write()
            .await
            .insert(session.id, session.clone());

        info!("Session {} connected", session.id);
        (session, rx)
    }

    pub async fn get(&self, id: SessionId) -> Option<Session> {
        self.sessions.read().await.get(&id).cloned()
    }

    pub async fn set_user(&self, id: SessionId, user_id: String) -> Result<(), RoomError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(&id)
            .ok_or(RoomError::SessionNotFound(id))?;
        session.user_id = Some(user_id);
        Ok(())
    }

    pub(crate) async fn set_room(&self, id: SessionId, room_id: Option<String>) {
        if let Some(session) = self.sessions.write().await.get_mut(&id) {
            session.room_id = room_id;
        }
    }

    pub async fn remove(&self, id: SessionId) -> Option<Session> {
        let removed = self.sessions.write().await.remove(&id);
        if removed.is_some() {
            info!("Session {} disconnected", id);
        }
        removed
    }

    /// Deliver an event to a single session.
    pub async fn deliver(&self, id: SessionId, event: ServerEvent) -> bool {
        let sessions = self.sessions.read().await;
        match sessions.get(&id) {
            Some(session) => {
                let delivered = session.deliver(event);
                if !delivered {
                    debug!("Dropped event for session {}: transport closed", id);
                }
                delivered
            }
            None => false,
        }
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drop every session. Outboxes close once the registry's copies and
    /// all room memberships are gone.
    pub async fn clear(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let count = sessions.len();
        sessions.clear();
        count
    }
}
