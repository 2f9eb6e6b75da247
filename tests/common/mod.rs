// In-memory capabilities shared by the integration tests
#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use lingua_rooms::speech::{
    RecognitionEvent, RecognitionOptions, RecognitionResult, SpeechCapability, SpeechRecognizer,
};
use lingua_rooms::synthesis::{SynthesisTask, Synthesizer};
use lingua_rooms::translation::{TranslateParams, TranslationProvider, TranslationResponse};
use lingua_rooms::{SpeechErrorKind, SynthesisError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::time::Duration;

// ============================================================================
// Speech
// ============================================================================

/// Hands each new event stream's sender to the test
pub struct ScriptedRecognizer {
    streams: mpsc::UnboundedSender<mpsc::Sender<RecognitionEvent>>,
    fail_with: Option<SpeechErrorKind>,
}

#[async_trait]
impl SpeechRecognizer for ScriptedRecognizer {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn start(
        &mut self,
        _options: &RecognitionOptions,
    ) -> Result<mpsc::Receiver<RecognitionEvent>, SpeechErrorKind> {
        if let Some(kind) = self.fail_with {
            return Err(kind);
        }
        let (tx, rx) = mpsc::channel(16);
        let _ = self.streams.send(tx);
        Ok(rx)
    }

    async fn stop(&mut self) {}
}

pub fn scripted_recognizer(
    fail_with: Option<SpeechErrorKind>,
) -> (
    SpeechCapability,
    mpsc::UnboundedReceiver<mpsc::Sender<RecognitionEvent>>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    let recognizer = ScriptedRecognizer {
        streams: tx,
        fail_with,
    };
    (SpeechCapability::Available(Box::new(recognizer)), rx)
}

pub fn final_result(transcript: &str, confidence: f32) -> RecognitionEvent {
    RecognitionEvent::Result(RecognitionResult {
        transcript: transcript.to_string(),
        confidence,
        is_final: true,
        alternatives: Vec::new(),
    })
}

pub fn interim_result(transcript: &str, confidence: f32) -> RecognitionEvent {
    RecognitionEvent::Result(RecognitionResult {
        transcript: transcript.to_string(),
        confidence,
        is_final: false,
        alternatives: Vec::new(),
    })
}

// ============================================================================
// Translation
// ============================================================================

/// Provider that always fails
pub struct FailingProvider {
    name: String,
    pub calls: AtomicUsize,
}

impl FailingProvider {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl TranslationProvider for FailingProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn translate(&self, _params: &TranslateParams) -> Result<TranslationResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(anyhow!("{} is down", self.name))
    }
}

/// Provider returning a fixed translation
pub struct FixedProvider {
    text: String,
    confidence: f32,
    pub calls: AtomicUsize,
}

impl FixedProvider {
    pub fn new(text: &str, confidence: f32) -> Arc<Self> {
        Arc::new(Self {
            text: text.to_string(),
            confidence,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl TranslationProvider for FixedProvider {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn translate(&self, params: &TranslateParams) -> Result<TranslationResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(TranslationResponse {
            translated_text: self.text.clone(),
            confidence: self.confidence,
            detected_language: Some(params.from.clone()),
            alternatives: Vec::new(),
        })
    }
}

/// Provider answering `"<to>:<text>"` after a delay chosen per target
/// language
pub struct EchoProvider {
    delays: Vec<(String, Duration)>,
    pub calls: AtomicUsize,
}

impl EchoProvider {
    pub fn new(delays: &[(&str, Duration)]) -> Arc<Self> {
        Arc::new(Self {
            delays: delays
                .iter()
                .map(|(lang, delay)| (lang.to_string(), *delay))
                .collect(),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl TranslationProvider for EchoProvider {
    fn name(&self) -> &str {
        "echo"
    }

    async fn translate(&self, params: &TranslateParams) -> Result<TranslationResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = self
            .delays
            .iter()
            .find(|(lang, _)| *lang == params.to)
            .map(|(_, delay)| *delay)
            .unwrap_or_default();
        tokio::time::sleep(delay).await;

        Ok(TranslationResponse {
            translated_text: format!("{}:{}", params.to, params.text),
            confidence: 0.8,
            detected_language: None,
            alternatives: Vec::new(),
        })
    }
}

// ============================================================================
// Synthesis
// ============================================================================

/// Synthesizer that "speaks" for a fixed time and records what it did
pub struct RecordingSynthesizer {
    duration: Duration,
    active: AtomicUsize,
    pub max_active: AtomicUsize,
    pub spoken: Mutex<Vec<String>>,
    pub cancels: AtomicUsize,
}

impl RecordingSynthesizer {
    pub fn new(duration: Duration) -> Arc<Self> {
        Arc::new(Self {
            duration,
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
            spoken: Mutex::new(Vec::new()),
            cancels: AtomicUsize::new(0),
        })
    }

    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }
}

#[async_trait]
impl Synthesizer for RecordingSynthesizer {
    fn name(&self) -> &str {
        "recording"
    }

    async fn speak(&self, task: &SynthesisTask) -> Result<(), SynthesisError> {
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(active, Ordering::SeqCst);

        tokio::time::sleep(self.duration).await;

        self.spoken.lock().unwrap().push(task.text.clone());
        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }

    async fn cancel(&self) {
        // The interrupted speak future is dropped mid-sleep
        self.active.fetch_sub(1, Ordering::SeqCst);
        self.cancels.fetch_add(1, Ordering::SeqCst);
    }
}
