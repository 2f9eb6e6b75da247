//! Speech capture
//!
//! The recognizer is an optional capability (`SpeechCapability`). Its events
//! drive a pure `SpeechMachine`; the `SpeechController` task owns both, runs
//! the silence and max-duration timers, and debounces start/stop requests.
//!
//! Committed utterances and interim text are reported on one channel,
//! recognition errors on another.

mod capability;
mod controller;
mod debounce;
mod machine;

pub use capability::{
    Alternative, RecognitionEvent, RecognitionOptions, RecognitionResult, SpeechCapability,
    SpeechRecognizer,
};
pub use controller::{SpeechChannels, SpeechController, SpeechUpdate};
pub use debounce::{ControlCommand, Debouncer};
pub use machine::{SpeechEffect, SpeechMachine, SpeechSettings, SpeechStatus, StopReason, Utterance};
