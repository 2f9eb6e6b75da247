use serde::{Deserialize, Serialize};

use crate::conversation::Message;
use crate::room::{ParticipantInfo, RoomSnapshot};
use crate::session::SessionId;

/// Events sent by clients over the real-time connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    Join {
        room_id: String,
        /// Identity to attach to the session before joining
        #[serde(default)]
        user_id: Option<String>,
        /// Language the participant speaks
        #[serde(default)]
        language: Option<String>,
    },
    Leave {
        room_id: String,
    },
    Send {
        content: String,
        lang: String,
        target_lang: String,
    },
    TypingStart,
    TypingStop,
    TranslateRequest {
        message_id: String,
        text: String,
        from: String,
        to: String,
    },
}

/// Events pushed to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    Connected {
        session_id: SessionId,
    },
    MessageNew {
        message: Message,
    },
    UserJoined {
        participant: ParticipantInfo,
    },
    UserLeft {
        user_id: String,
    },
    UserTyping {
        user_id: String,
    },
    UserStoppedTyping {
        user_id: String,
    },
    TranslationComplete {
        message_id: String,
        translated_text: String,
        confidence: f32,
    },
    RoomUpdated {
        room: RoomSnapshot,
    },
    Error {
        code: String,
        message: String,
        /// Set when the error concerns a single message
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message_id: Option<String>,
    },
}

impl ServerEvent {
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        ServerEvent::Error {
            code: code.to_string(),
            message: message.into(),
            message_id: None,
        }
    }
}
