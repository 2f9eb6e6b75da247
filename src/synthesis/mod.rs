//! Speech synthesis
//!
//! `SynthesisQueue` speaks queued tasks strictly one at a time: the next task
//! is dequeued only after the current one completes, fails or is cancelled.
//! `AutoSpeaker` decides which translated messages get queued.

mod auto_speak;
mod capability;
mod queue;

pub use auto_speak::AutoSpeaker;
pub use capability::{SynthesisCapability, SynthesisSettings, SynthesisTask, Synthesizer, VoiceOptions};
pub use queue::{SynthesisEvent, SynthesisQueue};
