use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard, RwLock};
use tracing::{debug, info, warn};

use super::room::{Participant, ParticipantInfo, Room, RoomSettings, RoomSnapshot};
use crate::error::RoomError;
use crate::gateway::ServerEvent;
use crate::session::{Session, SessionId, SessionRegistry};

/// Result of a successful join
#[derive(Debug, Clone)]
pub struct JoinOutcome {
    /// Target room after the join
    pub snapshot: RoomSnapshot,

    /// The joining participant as other members see it
    pub participant: ParticipantInfo,

    /// True when the session was already a member (join was a no-op)
    pub already_member: bool,

    /// Departure from the session's prior room, if it had one
    pub left: Option<LeaveOutcome>,
}

/// A participant's departure from a room
#[derive(Debug, Clone)]
pub struct LeaveOutcome {
    pub room_id: String,
    pub participant: ParticipantInfo,

    /// Remaining room state, or `None` when the room was removed
    pub snapshot: Option<RoomSnapshot>,
}

impl LeaveOutcome {
    pub fn room_closed(&self) -> bool {
        self.snapshot.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    pub active_rooms: usize,
    pub active_sessions: usize,
}

struct RoomSlot {
    id: String,

    /// Set under the room lock when the last participant leaves. A closed
    /// slot is never joined again; it is removed from the map right after.
    closed: AtomicBool,

    room: Mutex<Room>,
}

impl RoomSlot {
    fn new(room: Room, id: &str) -> Self {
        Self {
            id: id.to_string(),
            closed: AtomicBool::new(false),
            room: Mutex::new(room),
        }
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Authoritative mapping of rooms to participant sessions.
///
/// Lock order: the room map lock may be held while acquiring a room lock,
/// never the other way round. When two rooms are locked together (moving
/// between rooms) they are locked in room id order.
pub struct RoomRegistry {
    rooms: RwLock<HashMap<String, Arc<RoomSlot>>>,
    sessions: Arc<SessionRegistry>,
    defaults: RoomSettings,
}

impl RoomRegistry {
    pub fn new(sessions: Arc<SessionRegistry>, defaults: RoomSettings) -> Self {
        info!(
            "Room registry initialized (max {} participants per room)",
            defaults.max_participants
        );

        Self {
            rooms: RwLock::new(HashMap::new()),
            sessions,
            defaults,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }

    /// Move a session into `room_id`, leaving its prior room first.
    ///
    /// Creates the room when absent. Joining a room the session is already
    /// in is a no-op. A rejected join changes nothing.
    pub async fn join(
        &self,
        session_id: SessionId,
        room_id: &str,
        language: Option<String>,
    ) -> Result<JoinOutcome, RoomError> {
        self.join_as(session_id, room_id, None, language).await
    }

    /// Like [`RoomRegistry::join`], but enters the room as `user_id`.
    ///
    /// The session adopts `user_id` only once it is admitted.
    pub async fn join_as(
        &self,
        session_id: SessionId,
        room_id: &str,
        user_id: Option<String>,
        language: Option<String>,
    ) -> Result<JoinOutcome, RoomError> {
        let session = self
            .sessions
            .get(session_id)
            .await
            .ok_or(RoomError::SessionNotFound(session_id))?;
        let participant = Participant::new(&session, user_id.clone(), language);

        loop {
            let existing = self.rooms.read().await.get(room_id).cloned();
            let attempt = match existing {
                Some(slot) => self.join_existing(&session, slot, participant.clone()).await?,
                None => self.join_new(&session, room_id, participant.clone()).await?,
            };

            match attempt {
                Some(outcome) => {
                    if let Some(user_id) = user_id.filter(|_| !outcome.already_member) {
                        if let Err(e) = self.sessions.set_user(session_id, user_id).await {
                            debug!("Session left before adopting its user id: {}", e);
                        }
                    }
                    self.sessions
                        .set_room(session_id, Some(room_id.to_string()))
                        .await;
                    if !outcome.already_member {
                        info!(
                            "Session {} joined room {} ({} participants)",
                            session_id, room_id, outcome.snapshot.participant_count
                        );
                    }
                    return Ok(outcome);
                }
                None => debug!("Room {} closed during join, retrying", room_id),
            }
        }
    }

    async fn join_existing(
        &self,
        session: &Session,
        slot: Arc<RoomSlot>,
        participant: Participant,
    ) -> Result<Option<JoinOutcome>, RoomError> {
        let prior_slot = self.prior_slot(session, &slot.id).await;
        let (mut target, prior) = lock_pair(&slot, prior_slot.as_deref()).await;

        if slot.is_closed() {
            return Ok(None);
        }

        if let Some(existing) = target.get(session.id) {
            return Ok(Some(JoinOutcome {
                snapshot: target.snapshot(),
                participant: existing.clone(),
                already_member: true,
                left: None,
            }));
        }

        target.admit(participant.info())?;

        let left = match (prior_slot.as_deref(), prior) {
            (Some(prior_slot), Some(mut prior)) => detach(prior_slot, &mut prior, session.id),
            _ => None,
        };

        let info = participant.info().clone();
        target.insert(participant);
        let snapshot = target.snapshot();
        drop(target);

        if let (Some(prior_slot), Some(left)) = (&prior_slot, &left) {
            if left.room_closed() {
                self.purge(prior_slot).await;
            }
        }

        Ok(Some(JoinOutcome {
            snapshot,
            participant: info,
            already_member: false,
            left,
        }))
    }

    async fn join_new(
        &self,
        session: &Session,
        room_id: &str,
        participant: Participant,
    ) -> Result<Option<JoinOutcome>, RoomError> {
        let mut rooms = self.rooms.write().await;
        if rooms.contains_key(room_id) {
            return Ok(None);
        }

        let mut room = Room::new(room_id, self.defaults.clone());
        room.admit(participant.info())?;

        let prior_slot = session
            .room_id
            .as_deref()
            .filter(|prior| *prior != room_id)
            .and_then(|prior| rooms.get(prior).cloned());

        let left = match prior_slot {
            Some(prior_slot) => {
                let mut prior = prior_slot.room.lock().await;
                let left = detach(&prior_slot, &mut prior, session.id);
                drop(prior);
                if left.as_ref().is_some_and(LeaveOutcome::room_closed) {
                    rooms.remove(&prior_slot.id);
                    info!("Room {} removed (empty)", prior_slot.id);
                }
                left
            }
            None => None,
        };

        let info = participant.info().clone();
        room.insert(participant);
        let snapshot = room.snapshot();
        rooms.insert(room_id.to_string(), Arc::new(RoomSlot::new(room, room_id)));

        info!("Room {} created", room_id);

        Ok(Some(JoinOutcome {
            snapshot,
            participant: info,
            already_member: false,
            left,
        }))
    }

    /// Remove a session from its current room. Not being in a room is a
    /// no-op. The room is deleted when it becomes empty.
    pub async fn leave(&self, session_id: SessionId) -> Result<Option<LeaveOutcome>, RoomError> {
        let session = self
            .sessions
            .get(session_id)
            .await
            .ok_or(RoomError::SessionNotFound(session_id))?;

        let Some(room_id) = session.room_id else {
            return Ok(None);
        };

        let slot = self.rooms.read().await.get(&room_id).cloned();
        let left = match slot {
            Some(slot) => {
                let mut room = slot.room.lock().await;
                let left = detach(&slot, &mut room, session_id);
                drop(room);
                if left.as_ref().is_some_and(LeaveOutcome::room_closed) {
                    self.purge(&slot).await;
                }
                left
            }
            None => None,
        };

        self.sessions.set_room(session_id, None).await;

        if let Some(left) = &left {
            info!("Session {} left room {}", session_id, left.room_id);
        }

        Ok(left)
    }

    /// Implicit leave plus session teardown.
    pub async fn on_disconnect(&self, session_id: SessionId) -> Option<LeaveOutcome> {
        let left = match self.leave(session_id).await {
            Ok(left) => left,
            Err(e) => {
                debug!("Disconnect for unknown session {}: {}", session_id, e);
                None
            }
        };
        self.sessions.remove(session_id).await;
        left
    }

    /// Deliver `event` to every member of `room_id` except `exclude`.
    ///
    /// Returns the number of deliveries; members whose transport already
    /// closed are skipped silently.
    pub async fn broadcast(
        &self,
        room_id: &str,
        event: ServerEvent,
        exclude: Option<SessionId>,
    ) -> Result<usize, RoomError> {
        let slot = self
            .rooms
            .read()
            .await
            .get(room_id)
            .cloned()
            .ok_or_else(|| RoomError::RoomNotFound(room_id.to_string()))?;

        let mut room = slot.room.lock().await;
        if slot.is_closed() {
            return Err(RoomError::RoomNotFound(room_id.to_string()));
        }
        room.touch();

        Ok(room.broadcast(&event, exclude))
    }

    pub async fn snapshot(&self, room_id: &str) -> Result<RoomSnapshot, RoomError> {
        let slot = self
            .rooms
            .read()
            .await
            .get(room_id)
            .cloned()
            .ok_or_else(|| RoomError::RoomNotFound(room_id.to_string()))?;

        let room = slot.room.lock().await;
        if slot.is_closed() {
            return Err(RoomError::RoomNotFound(room_id.to_string()));
        }
        Ok(room.snapshot())
    }

    pub async fn contains(&self, room_id: &str) -> bool {
        self.rooms
            .read()
            .await
            .get(room_id)
            .is_some_and(|slot| !slot.is_closed())
    }

    pub async fn room_count(&self) -> usize {
        self.rooms
            .read()
            .await
            .values()
            .filter(|slot| !slot.is_closed())
            .count()
    }

    pub async fn stats(&self) -> RegistryStats {
        RegistryStats {
            active_rooms: self.room_count().await,
            active_sessions: self.sessions.count().await,
        }
    }

    /// Tear down every room and session.
    pub async fn shutdown(&self) {
        let rooms = {
            let mut rooms = self.rooms.write().await;
            for slot in rooms.values() {
                slot.closed.store(true, Ordering::SeqCst);
            }
            let count = rooms.len();
            rooms.clear();
            count
        };
        let sessions = self.sessions.clear().await;

        if rooms > 0 || sessions > 0 {
            warn!(
                "Registry shut down with {} room(s) and {} session(s) still active",
                rooms, sessions
            );
        } else {
            info!("Registry shut down");
        }
    }

    async fn prior_slot(&self, session: &Session, target: &str) -> Option<Arc<RoomSlot>> {
        let prior = session.room_id.as_deref().filter(|prior| *prior != target)?;
        self.rooms.read().await.get(prior).cloned()
    }

    /// Remove a closed slot, unless the id has already been reused.
    async fn purge(&self, slot: &Arc<RoomSlot>) {
        let mut rooms = self.rooms.write().await;
        if rooms
            .get(&slot.id)
            .is_some_and(|current| Arc::ptr_eq(current, slot))
        {
            rooms.remove(&slot.id);
            info!("Room {} removed (empty)", slot.id);
        }
    }
}

/// Remove `session_id` from a locked room, closing the slot if it empties.
fn detach(slot: &RoomSlot, room: &mut Room, session_id: SessionId) -> Option<LeaveOutcome> {
    let participant = room.remove(session_id)?;

    let snapshot = if room.is_empty() {
        slot.closed.store(true, Ordering::SeqCst);
        None
    } else {
        Some(room.snapshot())
    };

    Some(LeaveOutcome {
        room_id: slot.id.clone(),
        participant,
        snapshot,
    })
}

async fn lock_pair<'a>(
    target: &'a RoomSlot,
    prior: Option<&'a RoomSlot>,
) -> (MutexGuard<'a, Room>, Option<MutexGuard<'a, Room>>) {
    match prior {
        Some(prior) if prior.id < target.id => {
            let prior = prior.room.lock().await;
            let target = target.room.lock().await;
            (target, Some(prior))
        }
        Some(prior) => {
            let target = target.room.lock().await;
            let prior = prior.room.lock().await;
            (target, Some(prior))
        }
        None => (target.room.lock().await, None),
    }
}
