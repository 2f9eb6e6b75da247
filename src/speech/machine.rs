use serde::{Deserialize, Serialize};
use tokio::time::{Duration, Instant};

use super::capability::{Alternative, RecognitionEvent, RecognitionOptions, RecognitionResult};
use crate::error::SpeechErrorKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeechStatus {
    Idle,
    Listening,
    /// Interim results are arriving; a final result has not yet
    Processing,
    /// Terminal until the caller starts again
    Error,
    Stopped,
}

impl SpeechStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, SpeechStatus::Listening | SpeechStatus::Processing)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Requested,
    Silence,
    MaxDuration,
}

/// One committed final recognition result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utterance {
    pub transcript: String,
    pub confidence: f32,
    pub alternatives: Vec<Alternative>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechSettings {
    /// Recognition language (BCP 47)
    pub language: String,

    /// Keep listening after each final result
    pub continuous: bool,

    pub interim_results: bool,

    /// Final results below this confidence are dropped
    pub confidence_threshold: f32,

    /// Automatic restarts allowed after recoverable errors
    pub max_retries: u32,

    pub silence_timeout_ms: u64,
    pub max_duration_ms: u64,
    pub start_debounce_ms: u64,
    pub stop_debounce_ms: u64,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            language: "en-US".to_string(),
            continuous: true,
            interim_results: true,
            confidence_threshold: 0.6,
            max_retries: 3,
            silence_timeout_ms: 5_000,
            max_duration_ms: 60_000,
            start_debounce_ms: 300,
            stop_debounce_ms: 300,
        }
    }
}

impl SpeechSettings {
    pub fn silence_timeout(&self) -> Duration {
        Duration::from_millis(self.silence_timeout_ms)
    }

    pub fn max_duration(&self) -> Duration {
        Duration::from_millis(self.max_duration_ms)
    }

    pub fn start_debounce(&self) -> Duration {
        Duration::from_millis(self.start_debounce_ms)
    }

    pub fn stop_debounce(&self) -> Duration {
        Duration::from_millis(self.stop_debounce_ms)
    }

    pub fn recognition_options(&self) -> RecognitionOptions {
        RecognitionOptions {
            language: self.language.clone(),
            continuous: self.continuous,
            interim_results: self.interim_results,
        }
    }
}

/// Side effects requested by a transition, in order
#[derive(Debug, Clone, PartialEq)]
pub enum SpeechEffect {
    StartRecognizer,
    StopRecognizer,
    Interim { transcript: String, confidence: f32 },
    Utterance(Utterance),
    /// Final result dropped for low confidence
    Suppressed { transcript: String, confidence: f32 },
    Retrying { attempt: u32, error: SpeechErrorKind },
    Failed(SpeechErrorKind),
    Stopped(StopReason),
    /// Single-shot session finished and returned to idle
    Completed,
}

/// Speech capture state machine for one client.
///
/// Pure: it never touches the recognizer or the clock. Callers pass the
/// current instant in and carry out the returned effects.
#[derive(Debug)]
pub struct SpeechMachine {
    settings: SpeechSettings,
    supported: bool,
    unsupported_reported: bool,
    status: SpeechStatus,
    final_transcript: String,
    interim_transcript: String,
    retries: u32,
    silence_deadline: Option<Instant>,
    max_deadline: Option<Instant>,
}

impl SpeechMachine {
    pub fn new(settings: SpeechSettings, supported: bool) -> Self {
        Self {
            settings,
            supported,
            unsupported_reported: false,
            status: SpeechStatus::Idle,
            final_transcript: String::new(),
            interim_transcript: String::new(),
            retries: 0,
            silence_deadline: None,
            max_deadline: None,
        }
    }

    pub fn status(&self) -> SpeechStatus {
        self.status
    }

    pub fn settings(&self) -> &SpeechSettings {
        &self.settings
    }

    /// Final transcripts accepted since the last start
    pub fn final_transcript(&self) -> &str {
        &self.final_transcript
    }

    pub fn interim_transcript(&self) -> &str {
        &self.interim_transcript
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn start(&mut self, now: Instant) -> Vec<SpeechEffect> {
        if !self.supported {
            if self.unsupported_reported {
                return Vec::new();
            }
            self.unsupported_reported = true;
            return vec![SpeechEffect::Failed(SpeechErrorKind::Unsupported)];
        }

        if self.status.is_active() {
            return Vec::new();
        }

        // Retry budget is per session start
        self.retries = 0;
        self.status = SpeechStatus::Listening;
        self.final_transcript.clear();
        self.interim_transcript.clear();
        self.silence_deadline = Some(now + self.settings.silence_timeout());
        self.max_deadline = Some(now + self.settings.max_duration());

        vec![SpeechEffect::StartRecognizer]
    }

    pub fn stop(&mut self) -> Vec<SpeechEffect> {
        self.clear_timers();
        self.interim_transcript.clear();

        match self.status {
            SpeechStatus::Listening | SpeechStatus::Processing => {
                self.status = SpeechStatus::Stopped;
                vec![
                    SpeechEffect::StopRecognizer,
                    SpeechEffect::Stopped(StopReason::Requested),
                ]
            }
            SpeechStatus::Error => {
                self.status = SpeechStatus::Stopped;
                vec![SpeechEffect::Stopped(StopReason::Requested)]
            }
            SpeechStatus::Idle | SpeechStatus::Stopped => Vec::new(),
        }
    }

    pub fn on_event(&mut self, event: RecognitionEvent, now: Instant) -> Vec<SpeechEffect> {
        // Late events from a recognizer we already stopped
        if !self.status.is_active() {
            return Vec::new();
        }

        match event {
            RecognitionEvent::VoiceActivity => {
                self.touch(now);
                Vec::new()
            }
            RecognitionEvent::Result(result) if !result.is_final => {
                self.touch(now);
                self.status = SpeechStatus::Processing;
                self.interim_transcript = result.transcript.clone();
                vec![SpeechEffect::Interim {
                    transcript: result.transcript,
                    confidence: result.confidence,
                }]
            }
            RecognitionEvent::Result(result) => self.on_final(result, now),
            RecognitionEvent::Error(kind) => self.on_error(kind),
            RecognitionEvent::End => {
                if self.settings.continuous {
                    self.interim_transcript.clear();
                    self.status = SpeechStatus::Listening;
                    vec![SpeechEffect::StartRecognizer]
                } else {
                    self.finish_single_shot();
                    vec![SpeechEffect::Completed]
                }
            }
        }
    }

    /// Fire whichever timer has elapsed.
    pub fn on_tick(&mut self, now: Instant) -> Vec<SpeechEffect> {
        if !self.status.is_active() {
            return Vec::new();
        }

        let reason = if self.max_deadline.is_some_and(|due| due <= now) {
            StopReason::MaxDuration
        } else if self.silence_deadline.is_some_and(|due| due <= now) {
            StopReason::Silence
        } else {
            return Vec::new();
        };

        self.clear_timers();
        self.interim_transcript.clear();
        self.status = SpeechStatus::Stopped;

        vec![SpeechEffect::StopRecognizer, SpeechEffect::Stopped(reason)]
    }

    /// Earliest pending timer, while listening
    pub fn next_deadline(&self) -> Option<Instant> {
        if !self.status.is_active() {
            return None;
        }
        match (self.silence_deadline, self.max_deadline) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn on_final(&mut self, result: RecognitionResult, now: Instant) -> Vec<SpeechEffect> {
        self.touch(now);
        self.interim_transcript.clear();

        if !(result.confidence >= self.settings.confidence_threshold) {
            self.status = SpeechStatus::Listening;
            return vec![SpeechEffect::Suppressed {
                transcript: result.transcript,
                confidence: result.confidence,
            }];
        }

        if !self.final_transcript.is_empty() {
            self.final_transcript.push(' ');
        }
        self.final_transcript.push_str(result.transcript.trim());

        let utterance = SpeechEffect::Utterance(Utterance {
            transcript: result.transcript,
            confidence: result.confidence,
            alternatives: result.alternatives,
        });

        if self.settings.continuous {
            self.status = SpeechStatus::Listening;
            vec![utterance]
        } else {
            self.finish_single_shot();
            vec![utterance, SpeechEffect::StopRecognizer, SpeechEffect::Completed]
        }
    }

    fn on_error(&mut self, kind: SpeechErrorKind) -> Vec<SpeechEffect> {
        self.interim_transcript.clear();

        if kind.is_recoverable() && self.retries < self.settings.max_retries {
            self.retries += 1;
            self.status = SpeechStatus::Listening;
            return vec![
                SpeechEffect::Retrying {
                    attempt: self.retries,
                    error: kind,
                },
                SpeechEffect::StartRecognizer,
            ];
        }

        self.clear_timers();
        self.status = SpeechStatus::Error;
        vec![SpeechEffect::StopRecognizer, SpeechEffect::Failed(kind)]
    }

    fn finish_single_shot(&mut self) {
        self.clear_timers();
        self.interim_transcript.clear();
        self.status = SpeechStatus::Idle;
    }

    fn touch(&mut self, now: Instant) {
        self.silence_deadline = Some(now + self.settings.silence_timeout());
    }

    fn clear_timers(&mut self) {
        self.silence_deadline = None;
        self.max_deadline = None;
    }
}
