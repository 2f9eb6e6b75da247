use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::messages::{ClientEvent, ServerEvent};
use crate::conversation::{LanguagePair, Message};
use crate::error::{GatewayError, RoomError};
use crate::room::{LeaveOutcome, RoomRegistry};
use crate::session::{Session, SessionId, SessionRegistry};
use crate::translation::{TranslateParams, Translator};

/// Routes client events to the room registry and translator.
///
/// Transport-agnostic: the WebSocket layer only decodes frames and hands
/// them to `dispatch`.
pub struct Gateway {
    rooms: Arc<RoomRegistry>,
    translator: Arc<Translator>,
}

impl Gateway {
    pub fn new(rooms: Arc<RoomRegistry>, translator: Arc<Translator>) -> Self {
        Self { rooms, translator }
    }

    pub fn rooms(&self) -> &Arc<RoomRegistry> {
        &self.rooms
    }

    fn sessions(&self) -> &Arc<SessionRegistry> {
        self.rooms.sessions()
    }

    /// Register a connection and greet it with its session id.
    pub async fn connect(
        &self,
        user_id: Option<String>,
    ) -> (Session, mpsc::UnboundedReceiver<ServerEvent>) {
        let (session, outbox) = self.sessions().connect(user_id).await;
        session.deliver(ServerEvent::Connected {
            session_id: session.id,
        });
        (session, outbox)
    }

    /// Handle one event, reporting failures back to the sender as `error`.
    pub async fn dispatch(&self, session_id: SessionId, event: ClientEvent) {
        if let Err(e) = self.handle(session_id, event).await {
            debug!("Rejected event from {}: {}", session_id, e);
            self.sessions()
                .deliver(session_id, ServerEvent::error(e.code(), e.to_string()))
                .await;
        }
    }

    pub async fn handle(&self, session_id: SessionId, event: ClientEvent) -> Result<(), GatewayError> {
        match event {
            ClientEvent::Join {
                room_id,
                user_id,
                language,
            } => self.join(session_id, &room_id, user_id, language).await,
            ClientEvent::Leave { room_id } => self.leave(session_id, &room_id).await,
            ClientEvent::Send {
                content,
                lang,
                target_lang,
            } => {
                self.send(session_id, &content, LanguagePair::new(lang, target_lang))
                    .await
            }
            ClientEvent::TypingStart => self.typing(session_id, true).await,
            ClientEvent::TypingStop => self.typing(session_id, false).await,
            ClientEvent::TranslateRequest {
                message_id,
                text,
                from,
                to,
            } => {
                self.translate_request(session_id, message_id, text, LanguagePair::new(from, to))
                    .await
            }
        }
    }

    /// Transport closed: implicit leave, then session teardown.
    pub async fn disconnect(&self, session_id: SessionId) {
        if let Some(left) = self.rooms.on_disconnect(session_id).await {
            self.announce_departure(&left).await;
        }
    }

    async fn join(
        &self,
        session_id: SessionId,
        room_id: &str,
        user_id: Option<String>,
        language: Option<String>,
    ) -> Result<(), GatewayError> {
        if room_id.trim().is_empty() {
            return Err(GatewayError::InvalidEvent("room_id must not be empty".to_string()));
        }
        let outcome = self
            .rooms
            .join_as(session_id, room_id, user_id, language)
            .await?;

        if let Some(left) = &outcome.left {
            self.announce_departure(left).await;
        }

        if outcome.already_member {
            self.sessions()
                .deliver(
                    session_id,
                    ServerEvent::RoomUpdated {
                        room: outcome.snapshot,
                    },
                )
                .await;
            return Ok(());
        }

        self.broadcast_quietly(
            room_id,
            ServerEvent::UserJoined {
                participant: outcome.participant,
            },
            Some(session_id),
        )
        .await;
        self.broadcast_quietly(
            room_id,
            ServerEvent::RoomUpdated {
                room: outcome.snapshot,
            },
            None,
        )
        .await;

        Ok(())
    }

    async fn leave(&self, session_id: SessionId, room_id: &str) -> Result<(), GatewayError> {
        let session = self
            .sessions()
            .get(session_id)
            .await
            .ok_or(RoomError::SessionNotFound(session_id))?;

        if session.room_id.as_deref() != Some(room_id) {
            debug!("Session {} is not in room {}; leave ignored", session_id, room_id);
            return Ok(());
        }

        if let Some(left) = self.rooms.leave(session_id).await? {
            self.announce_departure(&left).await;
        }
        Ok(())
    }

    async fn send(
        &self,
        session_id: SessionId,
        content: &str,
        languages: LanguagePair,
    ) -> Result<(), GatewayError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(GatewayError::InvalidEvent(
                "message content must not be empty".to_string(),
            ));
        }

        let session = self.member(session_id).await?;
        let room_id = session.room_id.clone().ok_or(GatewayError::NotInRoom)?;

        let message = Message::new(content, &languages, session.participant_id());
        debug!("Message {} from {} in room {}", message.id, session_id, room_id);

        self.rooms
            .broadcast(&room_id, ServerEvent::MessageNew { message }, None)
            .await?;
        Ok(())
    }

    async fn typing(&self, session_id: SessionId, active: bool) -> Result<(), GatewayError> {
        let session = self.member(session_id).await?;
        let room_id = session.room_id.clone().ok_or(GatewayError::NotInRoom)?;
        let user_id = session.participant_id();

        let event = if active {
            ServerEvent::UserTyping { user_id }
        } else {
            ServerEvent::UserStoppedTyping { user_id }
        };

        self.rooms.broadcast(&room_id, event, Some(session_id)).await?;
        Ok(())
    }

    /// Translate on behalf of one client. Runs off the caller's read loop;
    /// the reply goes to the requester only.
    async fn translate_request(
        &self,
        session_id: SessionId,
        message_id: String,
        text: String,
        languages: LanguagePair,
    ) -> Result<(), GatewayError> {
        if message_id.is_empty() {
            return Err(GatewayError::InvalidEvent("message_id must not be empty".to_string()));
        }

        let session = self
            .sessions()
            .get(session_id)
            .await
            .ok_or(RoomError::SessionNotFound(session_id))?;
        let translator = Arc::clone(&self.translator);
        let params = TranslateParams::new(text, &languages);

        tokio::spawn(async move {
            let event = match translator.translate(&params).await {
                Ok(response) => ServerEvent::TranslationComplete {
                    message_id,
                    translated_text: response.translated_text,
                    confidence: response.confidence,
                },
                Err(e) => {
                    warn!("Translation for message {} failed: {}", message_id, e);
                    ServerEvent::Error {
                        code: e.code().to_string(),
                        message: e.to_string(),
                        message_id: Some(message_id),
                    }
                }
            };
            if !session.deliver(event) {
                debug!("Requester {} gone before translation finished", session.id);
            }
        });

        Ok(())
    }

    async fn member(&self, session_id: SessionId) -> Result<Session, GatewayError> {
        let session = self
            .sessions()
            .get(session_id)
            .await
            .ok_or(RoomError::SessionNotFound(session_id))?;
        if session.room_id.is_none() {
            return Err(GatewayError::NotInRoom);
        }
        Ok(session)
    }

    /// Tell the remaining members of a room that someone left.
    async fn announce_departure(&self, left: &LeaveOutcome) {
        let Some(snapshot) = &left.snapshot else {
            info!("Room {} closed after {} left", left.room_id, left.participant.user_id);
            return;
        };

        self.broadcast_quietly(
            &left.room_id,
            ServerEvent::UserLeft {
                user_id: left.participant.user_id.clone(),
            },
            None,
        )
        .await;
        self.broadcast_quietly(
            &left.room_id,
            ServerEvent::RoomUpdated {
                room: snapshot.clone(),
            },
            None,
        )
        .await;
    }

    /// Broadcast where a vanished room is not the caller's problem.
    async fn broadcast_quietly(&self, room_id: &str, event: ServerEvent, exclude: Option<SessionId>) {
        if let Err(e) = self.rooms.broadcast(room_id, event, exclude).await {
            debug!("Broadcast to {} skipped: {}", room_id, e);
        }
    }
}
