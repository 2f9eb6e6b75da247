use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

use super::message::Message;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    #[error("message {0} not found")]
    NotFound(String),

    #[error("message {0} already has a translation result")]
    AlreadySettled(String),
}

/// Ordered conversation log for one client.
///
/// Messages are appended once and their translation fields are written at
/// most once, through `apply_translation` or `mark_failed`.
#[derive(Debug, Default)]
pub struct ConversationLog {
    messages: Vec<Message>,
    index: HashMap<String, usize>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message. A message id already in the log is ignored.
    pub fn insert(&mut self, message: Message) -> bool {
        if self.index.contains_key(&message.id) {
            debug!("Ignoring duplicate message {}", message.id);
            return false;
        }
        self.index.insert(message.id.clone(), self.messages.len());
        self.messages.push(message);
        true
    }

    pub fn get(&self, id: &str) -> Option<&Message> {
        self.index.get(id).map(|&i| &self.messages[i])
    }

    pub fn apply_translation(
        &mut self,
        id: &str,
        translated: String,
        confidence: f32,
    ) -> Result<&Message, ApplyError> {
        let message = self.settle(id)?;
        message.translated_content = Some(translated);
        message.confidence = Some(confidence.clamp(0.0, 1.0));
        Ok(message)
    }

    pub fn mark_failed(&mut self, id: &str, error: String) -> Result<&Message, ApplyError> {
        let message = self.settle(id)?;
        message.translation_error = Some(error);
        Ok(message)
    }

    fn settle(&mut self, id: &str) -> Result<&mut Message, ApplyError> {
        let &i = self
            .index
            .get(id)
            .ok_or_else(|| ApplyError::NotFound(id.to_string()))?;
        let message = &mut self.messages[i];
        if message.is_settled() {
            return Err(ApplyError::AlreadySettled(id.to_string()));
        }
        Ok(message)
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
