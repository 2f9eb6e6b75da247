use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::gateway::ServerEvent;

/// Sending half of a session's transport.
///
/// Deliveries never block; a send to a closed transport just fails.
pub type Outbox = mpsc::UnboundedSender<ServerEvent>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A live connection and its identity.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,

    /// Identity claimed by the client, if any
    pub user_id: Option<String>,

    /// Room the session is currently in
    pub room_id: Option<String>,

    pub connected_at: DateTime<Utc>,

    outbox: Outbox,
}

impl Session {
    pub(crate) fn new(user_id: Option<String>, outbox: Outbox) -> Self {
        Self {
            id: SessionId::new(),
            user_id,
            room_id: None,
            connected_at: Utc::now(),
            outbox,
        }
    }

    /// User id shown to other participants. Falls back to the session id
    /// for anonymous connections.
    pub fn participant_id(&self) -> String {
        self.user_id
            .clone()
            .unwrap_or_else(|| format!("guest-{}", self.id))
    }

    pub fn outbox(&self) -> Outbox {
        self.outbox.clone()
    }

    /// Returns false when the transport has already closed.
    pub fn deliver(&self, event: ServerEvent) -> bool {
        self.outbox.send(event).is_ok()
    }
}
