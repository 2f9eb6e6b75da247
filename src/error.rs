use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::SessionId;

/// Rejections produced by the room registry.
///
/// None of these are fatal: a rejected join leaves the caller's prior
/// membership exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomError {
    #[error("room {room_id} is full ({max_participants} participants)")]
    RoomFull {
        room_id: String,
        max_participants: usize,
    },

    #[error("room {0} not found")]
    RoomNotFound(String),

    #[error("language {language} is not allowed in room {room_id}")]
    LanguageNotAllowed { room_id: String, language: String },

    #[error("user {user_id} is already in room {room_id}")]
    UserAlreadyInRoom { room_id: String, user_id: String },

    #[error("session {0} not found")]
    SessionNotFound(SessionId),
}

impl RoomError {
    pub fn code(&self) -> &'static str {
        match self {
            RoomError::RoomFull { .. } => "room_full",
            RoomError::RoomNotFound(_) => "room_not_found",
            RoomError::LanguageNotAllowed { .. } => "language_not_allowed",
            RoomError::UserAlreadyInRoom { .. } => "user_already_in_room",
            RoomError::SessionNotFound(_) => "session_not_found",
        }
    }
}

/// Errors reported by a speech recognizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeechErrorKind {
    #[error("speech recognition is not supported on this device")]
    Unsupported,

    #[error("microphone permission denied")]
    NotAllowed,

    #[error("no speech detected")]
    NoSpeech,

    #[error("audio capture failed")]
    AudioCapture,

    #[error("speech service network error")]
    Network,

    #[error("recognition aborted")]
    Aborted,
}

impl SpeechErrorKind {
    /// Recoverable errors are retried automatically up to `max_retries`.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SpeechErrorKind::NoSpeech | SpeechErrorKind::AudioCapture | SpeechErrorKind::Network
        )
    }

    pub fn code(&self) -> &'static str {
        match self {
            SpeechErrorKind::Unsupported => "speech_unsupported",
            _ if self.is_recoverable() => "speech_recoverable",
            _ => "speech_failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslationError {
    /// Every configured provider failed or timed out.
    #[error("translation service unavailable after {attempts} attempt(s)")]
    ServiceUnavailable { attempts: usize },
}

impl TranslationError {
    pub fn code(&self) -> &'static str {
        match self {
            TranslationError::ServiceUnavailable { .. } => "translation_unavailable",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SynthesisError {
    #[error("speech synthesis is not supported on this device")]
    Unsupported,

    #[error("synthesis failed: {0}")]
    Failed(String),

    #[error("utterance cancelled")]
    Cancelled,
}

/// Errors raised while routing a client event.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Room(#[from] RoomError),

    #[error("session is not in a room")]
    NotInRoom,

    #[error("invalid event: {0}")]
    InvalidEvent(String),

    #[error("transport dropped for session {0}")]
    TransportDropped(SessionId),
}

impl GatewayError {
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::Room(e) => e.code(),
            GatewayError::NotInRoom => "not_in_room",
            GatewayError::InvalidEvent(_) => "invalid_event",
            GatewayError::TransportDropped(_) => "transport_dropped",
        }
    }
}
