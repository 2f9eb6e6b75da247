use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::RoomError;
use crate::gateway::ServerEvent;
use crate::session::{Outbox, Session, SessionId};

/// Per-room limits applied on join
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomSettings {
    /// Maximum number of concurrent participants
    pub max_participants: usize,

    /// Languages participants may declare on join (empty = any)
    pub allowed_languages: Vec<String>,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            max_participants: 50,
            allowed_languages: Vec::new(),
        }
    }
}

impl RoomSettings {
    pub fn allows_language(&self, language: &str) -> bool {
        self.allowed_languages.is_empty()
            || self
                .allowed_languages
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(language))
    }
}

/// A room member as seen by everyone else
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantInfo {
    pub session_id: SessionId,
    pub user_id: String,
    pub language: Option<String>,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub(crate) struct Participant {
    info: ParticipantInfo,
    outbox: Outbox,
}

impl Participant {
    /// `user_id` overrides the identity the session connected with.
    pub(crate) fn new(
        session: &Session,
        user_id: Option<String>,
        language: Option<String>,
    ) -> Self {
        Self {
            info: ParticipantInfo {
                session_id: session.id,
                user_id: user_id.unwrap_or_else(|| session.participant_id()),
                language,
                joined_at: Utc::now(),
            },
            outbox: session.outbox(),
        }
    }

    pub(crate) fn info(&self) -> &ParticipantInfo {
        &self.info
    }
}

/// Immutable copy of a room's state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub room_id: String,
    pub participants: Vec<ParticipantInfo>,
    pub participant_count: usize,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub settings: RoomSettings,
}

pub(crate) struct Room {
    id: String,
    participants: BTreeMap<SessionId, Participant>,
    created_at: DateTime<Utc>,
    last_activity: DateTime<Utc>,
    settings: RoomSettings,
}

impl Room {
    pub(crate) fn new(id: &str, settings: RoomSettings) -> Self {
        let now = Utc::now();
        Self {
            id: id.to_string(),
            participants: BTreeMap::new(),
            created_at: now,
            last_activity: now,
            settings,
        }
    }

    pub(crate) fn get(&self, session_id: SessionId) -> Option<&ParticipantInfo> {
        self.participants.get(&session_id).map(Participant::info)
    }

    fn holds_user(&self, candidate: &ParticipantInfo) -> bool {
        self.participants.values().any(|p| {
            p.info.user_id == candidate.user_id && p.info.session_id != candidate.session_id
        })
    }

    /// Check whether `candidate` may join without changing anything.
    pub(crate) fn admit(&self, candidate: &ParticipantInfo) -> Result<(), RoomError> {
        if self.holds_user(candidate) {
            return Err(RoomError::UserAlreadyInRoom {
                room_id: self.id.clone(),
                user_id: candidate.user_id.clone(),
            });
        }

        if self.participants.len() >= self.settings.max_participants {
            return Err(RoomError::RoomFull {
                room_id: self.id.clone(),
                max_participants: self.settings.max_participants,
            });
        }

        if let Some(language) = &candidate.language {
            if !self.settings.allows_language(language) {
                return Err(RoomError::LanguageNotAllowed {
                    room_id: self.id.clone(),
                    language: language.clone(),
                });
            }
        }

        Ok(())
    }

    /// Insert a participant; a second insert for the same session or the
    /// same user id is a no-op.
    pub(crate) fn insert(&mut self, participant: Participant) -> bool {
        let session_id = participant.info.session_id;
        if self.participants.contains_key(&session_id) || self.holds_user(&participant.info) {
            return false;
        }
        self.participants.insert(session_id, participant);
        self.touch();
        true
    }

    pub(crate) fn remove(&mut self, session_id: SessionId) -> Option<ParticipantInfo> {
        let removed = self.participants.remove(&session_id).map(|p| p.info);
        if removed.is_some() {
            self.touch();
        }
        removed
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub(crate) fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    pub(crate) fn snapshot(&self) -> RoomSnapshot {
        let mut participants: Vec<ParticipantInfo> =
            self.participants.values().map(|p| p.info.clone()).collect();
        participants.sort_by(|a, b| {
            a.joined_at
                .cmp(&b.joined_at)
                .then_with(|| a.session_id.cmp(&b.session_id))
        });

        RoomSnapshot {
            room_id: self.id.clone(),
            participant_count: participants.len(),
            participants,
            created_at: self.created_at,
            last_activity: self.last_activity,
            settings: self.settings.clone(),
        }
    }

    /// Enqueue `event` on every member's outbox except `exclude`.
    ///
    /// Must be called with the room lock held so that every member observes
    /// the room's events in the same order. Closed transports are skipped.
    pub(crate) fn broadcast(&self, event: &ServerEvent, exclude: Option<SessionId>) -> usize {
        let mut delivered = 0;
        for (session_id, participant) in &self.participants {
            if Some(*session_id) == exclude {
                continue;
            }
            if participant.outbox.send(event.clone()).is_ok() {
                delivered += 1;
            } else {
                debug!(
                    "Dropped delivery to session {} in room {}: transport closed",
                    session_id, self.id
                );
            }
        }
        delivered
    }
}
