use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::SpeechErrorKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionOptions {
    pub language: String,
    /// Keep listening after a final result
    pub continuous: bool,
    pub interim_results: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alternative {
    pub transcript: String,
    pub confidence: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionResult {
    pub transcript: String,
    pub confidence: f32,
    pub is_final: bool,
    #[serde(default)]
    pub alternatives: Vec<Alternative>,
}

/// Events produced by a running recognizer
#[derive(Debug, Clone, PartialEq)]
pub enum RecognitionEvent {
    Result(RecognitionResult),
    /// Voice activity detected (resets the silence timer)
    VoiceActivity,
    Error(SpeechErrorKind),
    /// The recognizer ended on its own
    End,
}

/// Speech recognition capability.
///
/// Each `start` returns a fresh event stream; the previous one is abandoned.
#[async_trait::async_trait]
pub trait SpeechRecognizer: Send {
    /// Backend name for logging
    fn name(&self) -> &str;

    async fn start(
        &mut self,
        options: &RecognitionOptions,
    ) -> Result<mpsc::Receiver<RecognitionEvent>, SpeechErrorKind>;

    async fn stop(&mut self);
}

pub enum SpeechCapability {
    Available(Box<dyn SpeechRecognizer>),
    Unavailable,
}

impl SpeechCapability {
    pub fn is_available(&self) -> bool {
        matches!(self, SpeechCapability::Available(_))
    }
}
