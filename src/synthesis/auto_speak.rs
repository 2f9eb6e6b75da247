use tracing::debug;

use super::capability::{SynthesisTask, VoiceOptions};
use crate::conversation::Message;

/// Picks which translated messages are spoken automatically.
///
/// A message qualifies once it has a translation, its author is the local
/// participant and auto-speak is on. The last-processed marker keeps a
/// message from being queued twice when the same state is observed again.
#[derive(Debug, Clone)]
pub struct AutoSpeaker {
    local_user: String,
    enabled: bool,
    voice: VoiceOptions,
    last_processed: Option<String>,
}

impl AutoSpeaker {
    pub fn new(local_user: impl Into<String>, enabled: bool, voice: VoiceOptions) -> Self {
        Self {
            local_user: local_user.into(),
            enabled,
            voice,
            last_processed: None,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn last_processed(&self) -> Option<&str> {
        self.last_processed.as_deref()
    }

    pub fn observe(&mut self, message: &Message) -> Option<SynthesisTask> {
        if !self.enabled || message.author_id != self.local_user {
            return None;
        }
        let translated = message.translated_content.as_ref()?;
        if self.last_processed.as_deref() == Some(message.id.as_str()) {
            debug!("Message {} already spoken", message.id);
            return None;
        }

        self.last_processed = Some(message.id.clone());
        Some(SynthesisTask::new(
            translated.clone(),
            message.target_lang.clone(),
            self.voice.clone(),
        ))
    }
}
