use std::collections::VecDeque;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::capability::{RecognitionEvent, RecognitionOptions, SpeechCapability, SpeechRecognizer};
use super::debounce::{ControlCommand, Debouncer};
use super::machine::{SpeechEffect, SpeechMachine, SpeechSettings, SpeechStatus, StopReason, Utterance};
use crate::error::SpeechErrorKind;

/// Transcript-side output of the controller
#[derive(Debug, Clone, PartialEq)]
pub enum SpeechUpdate {
    /// Interim text, always reported regardless of confidence
    Interim { transcript: String, confidence: f32 },
    /// Committed utterance that passed the confidence filter
    Final(Utterance),
    /// Listening ended (explicit stop or a timer)
    Ended(StopReason),
}

/// Receiving ends of a controller's output channels.
///
/// Errors are kept apart from transcripts so that consumers can handle them
/// independently.
pub struct SpeechChannels {
    pub updates: mpsc::UnboundedReceiver<SpeechUpdate>,
    pub errors: mpsc::UnboundedReceiver<SpeechErrorKind>,
}

/// Handle to the speech capture task for one client
pub struct SpeechController {
    commands: mpsc::UnboundedSender<ControlCommand>,
    status: watch::Receiver<SpeechStatus>,
    task: JoinHandle<()>,
}

impl SpeechController {
    pub fn spawn(capability: SpeechCapability, settings: SpeechSettings) -> (Self, SpeechChannels) {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (updates_tx, updates_rx) = mpsc::unbounded_channel();
        let (errors_tx, errors_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(SpeechStatus::Idle);

        let recognizer = match capability {
            SpeechCapability::Available(recognizer) => {
                info!("Speech capture using {}", recognizer.name());
                Some(recognizer)
            }
            SpeechCapability::Unavailable => {
                warn!("Speech recognition unavailable on this device");
                None
            }
        };

        let driver = Driver {
            machine: SpeechMachine::new(settings.clone(), recognizer.is_some()),
            debouncer: Debouncer::new(settings.start_debounce(), settings.stop_debounce()),
            options: settings.recognition_options(),
            recognizer,
            events: None,
            updates: updates_tx,
            errors: errors_tx,
            status: status_tx,
        };

        let task = tokio::spawn(driver.run(commands_rx));

        (
            Self {
                commands: commands_tx,
                status: status_rx,
                task,
            },
            SpeechChannels {
                updates: updates_rx,
                errors: errors_rx,
            },
        )
    }

    /// Request a start. Rapid start/stop calls collapse to the last one.
    pub fn start(&self) {
        if self.commands.send(ControlCommand::Start).is_err() {
            warn!("Speech controller task has exited");
        }
    }

    pub fn stop(&self) {
        if self.commands.send(ControlCommand::Stop).is_err() {
            warn!("Speech controller task has exited");
        }
    }

    pub fn status(&self) -> SpeechStatus {
        *self.status.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SpeechStatus> {
        self.status.clone()
    }

    /// Stop listening and wait for the task to release the recognizer.
    pub async fn shutdown(self) {
        drop(self.commands);
        if let Err(e) = self.task.await {
            error!("Speech controller task panicked: {}", e);
        }
    }
}

struct Driver {
    machine: SpeechMachine,
    debouncer: Debouncer,
    options: RecognitionOptions,
    recognizer: Option<Box<dyn SpeechRecognizer>>,
    events: Option<mpsc::Receiver<RecognitionEvent>>,
    updates: mpsc::UnboundedSender<SpeechUpdate>,
    errors: mpsc::UnboundedSender<SpeechErrorKind>,
    status: watch::Sender<SpeechStatus>,
}

impl Driver {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<ControlCommand>) {
        debug!("Speech controller task started");

        loop {
            let deadline = earliest(self.machine.next_deadline(), self.debouncer.deadline());

            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.debouncer.submit(command, Instant::now()),
                    None => break,
                },
                event = next_event(&mut self.events) => match event {
                    Some(event) => {
                        let effects = self.machine.on_event(event, Instant::now());
                        self.apply(effects).await;
                    }
                    None => {
                        debug!("Recognizer event stream closed");
                        self.events = None;
                    }
                },
                _ = sleep_until(deadline) => {
                    let now = Instant::now();
                    if let Some(command) = self.debouncer.poll(now) {
                        let effects = match command {
                            ControlCommand::Start => self.machine.start(now),
                            ControlCommand::Stop => self.machine.stop(),
                        };
                        self.apply(effects).await;
                    }
                    let effects = self.machine.on_tick(now);
                    self.apply(effects).await;
                }
            }
        }

        let effects = self.machine.stop();
        self.apply(effects).await;
        debug!("Speech controller task stopped");
    }

    async fn apply(&mut self, effects: Vec<SpeechEffect>) {
        let mut queue: VecDeque<SpeechEffect> = effects.into();

        while let Some(effect) = queue.pop_front() {
            match effect {
                SpeechEffect::StartRecognizer => {
                    let Some(recognizer) = self.recognizer.as_mut() else {
                        continue;
                    };
                    match recognizer.start(&self.options).await {
                        Ok(events) => self.events = Some(events),
                        Err(kind) => {
                            self.events = None;
                            queue.extend(
                                self.machine
                                    .on_event(RecognitionEvent::Error(kind), Instant::now()),
                            );
                        }
                    }
                }
                SpeechEffect::StopRecognizer => {
                    if let Some(recognizer) = self.recognizer.as_mut() {
                        recognizer.stop().await;
                    }
                    self.events = None;
                }
                SpeechEffect::Interim {
                    transcript,
                    confidence,
                } => {
                    let _ = self.updates.send(SpeechUpdate::Interim {
                        transcript,
                        confidence,
                    });
                }
                SpeechEffect::Utterance(utterance) => {
                    info!(
                        "Utterance committed ({:.2}): {}",
                        utterance.confidence, utterance.transcript
                    );
                    let _ = self.updates.send(SpeechUpdate::Final(utterance));
                }
                SpeechEffect::Suppressed {
                    transcript,
                    confidence,
                } => {
                    debug!(
                        "Suppressed low-confidence result ({:.2} < {:.2}): {}",
                        confidence,
                        self.machine.settings().confidence_threshold,
                        transcript
                    );
                }
                SpeechEffect::Retrying { attempt, error } => {
                    warn!(
                        "Recoverable speech error ({}), retry {}/{}",
                        error,
                        attempt,
                        self.machine.settings().max_retries
                    );
                }
                SpeechEffect::Failed(kind) => {
                    error!("Speech capture failed: {}", kind);
                    let _ = self.errors.send(kind);
                }
                SpeechEffect::Stopped(reason) => {
                    info!("Speech capture stopped ({:?})", reason);
                    let _ = self.updates.send(SpeechUpdate::Ended(reason));
                }
                SpeechEffect::Completed => {
                    debug!("Single-shot recognition complete");
                }
            }
        }

        self.status.send_replace(self.machine.status());
    }
}

fn earliest(a: Option<Instant>, b: Option<Instant>) -> Option<Instant> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

async fn next_event(events: &mut Option<mpsc::Receiver<RecognitionEvent>>) -> Option<RecognitionEvent> {
    match events {
        Some(events) => events.recv().await,
        None => std::future::pending().await,
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
