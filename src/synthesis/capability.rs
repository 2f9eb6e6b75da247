use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::SynthesisError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceOptions {
    /// Speaking rate (1.0 = normal)
    pub rate: f32,
    pub pitch: f32,
    /// Volume (0.0 to 1.0)
    pub volume: f32,
    /// Preferred voice name, if the backend offers a choice
    pub voice: Option<String>,
}

impl Default for VoiceOptions {
    fn default() -> Self {
        Self {
            rate: 1.0,
            pitch: 1.0,
            volume: 1.0,
            voice: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisSettings {
    /// Speak translations of the local participant's own messages
    pub auto_speak: bool,
    pub voice: VoiceOptions,
}

impl Default for SynthesisSettings {
    fn default() -> Self {
        Self {
            auto_speak: true,
            voice: VoiceOptions::default(),
        }
    }
}

/// One "speak this text" request
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisTask {
    pub text: String,
    pub language: String,
    pub voice: VoiceOptions,
    pub enqueued_at: DateTime<Utc>,
}

impl SynthesisTask {
    pub fn new(text: impl Into<String>, language: impl Into<String>, voice: VoiceOptions) -> Self {
        Self {
            text: text.into(),
            language: language.into(),
            voice,
            enqueued_at: Utc::now(),
        }
    }
}

/// Speech synthesis capability
#[async_trait::async_trait]
pub trait Synthesizer: Send + Sync {
    fn name(&self) -> &str;

    /// Speak `task`, resolving when the utterance completes or fails
    async fn speak(&self, task: &SynthesisTask) -> Result<(), SynthesisError>;

    /// Cut off the utterance currently playing
    async fn cancel(&self);
}

pub enum SynthesisCapability {
    Available(Arc<dyn Synthesizer>),
    Unavailable,
}
