use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::conversation::{LanguagePair, Message};
use crate::error::{SpeechErrorKind, TranslationError};
use crate::speech::{
    SpeechCapability, SpeechChannels, SpeechController, SpeechSettings, SpeechStatus, SpeechUpdate,
    StopReason,
};
use crate::synthesis::{AutoSpeaker, SynthesisCapability, SynthesisEvent, SynthesisQueue, SynthesisSettings};
use crate::translation::{CorrelatorEvent, TranslationCorrelator, Translator};

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// User id of the local participant
    pub local_user: String,

    /// Initial language pair; changeable at runtime
    pub languages: LanguagePair,

    pub speech: SpeechSettings,
    pub synthesis: SynthesisSettings,
}

/// Everything the UI needs to render the local conversation
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    Interim { transcript: String },
    MessageCreated(Message),
    MessageTranslated(Message),
    TranslationFailed {
        message_id: String,
        error: TranslationError,
    },
    ListeningEnded(StopReason),
    SpeechError(SpeechErrorKind),
    Synthesis(SynthesisEvent),
}

enum Command {
    SetLanguages(LanguagePair),
    SetAutoSpeak(bool),
    Ingest(Message),
    ClearSpeech,
    Snapshot(oneshot::Sender<Vec<Message>>),
}

/// Handle to a running client pipeline
pub struct ClientPipeline {
    speech: SpeechController,
    commands: mpsc::UnboundedSender<Command>,
    task: JoinHandle<()>,
}

impl ClientPipeline {
    pub fn spawn(
        settings: PipelineSettings,
        speech: SpeechCapability,
        synthesis: SynthesisCapability,
        translator: Arc<Translator>,
    ) -> (Self, mpsc::UnboundedReceiver<PipelineEvent>) {
        let (speech_controller, speech_channels) =
            SpeechController::spawn(speech, settings.speech.clone());
        let (queue, synthesis_events) = SynthesisQueue::new(synthesis);
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        info!(
            "Client pipeline for {} ({} -> {})",
            settings.local_user, settings.languages.source, settings.languages.target
        );

        let worker = Worker {
            auto_speaker: AutoSpeaker::new(
                settings.local_user.clone(),
                settings.synthesis.auto_speak,
                settings.synthesis.voice.clone(),
            ),
            local_user: settings.local_user,
            languages: settings.languages,
            correlator: TranslationCorrelator::new(translator),
            queue,
            events: events_tx,
        };

        let task = tokio::spawn(worker.run(speech_channels, synthesis_events, commands_rx));

        (
            Self {
                speech: speech_controller,
                commands: commands_tx,
                task,
            },
            events_rx,
        )
    }

    pub fn start_listening(&self) {
        self.speech.start();
    }

    pub fn stop_listening(&self) {
        self.speech.stop();
    }

    pub fn speech_status(&self) -> SpeechStatus {
        self.speech.status()
    }

    /// Languages used for messages created from now on
    pub fn set_languages(&self, languages: LanguagePair) {
        self.send(Command::SetLanguages(languages));
    }

    pub fn set_auto_speak(&self, enabled: bool) {
        self.send(Command::SetAutoSpeak(enabled));
    }

    /// Add a message received from another participant
    pub fn ingest(&self, message: Message) {
        self.send(Command::Ingest(message));
    }

    /// Stop the current utterance and drop queued speech
    pub fn clear_speech(&self) {
        self.send(Command::ClearSpeech);
    }

    /// Current conversation log
    pub async fn messages(&self) -> Vec<Message> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Snapshot(tx));
        rx.await.unwrap_or_default()
    }

    pub async fn shutdown(self) {
        self.speech.shutdown().await;
        drop(self.commands);
        if let Err(e) = self.task.await {
            error!("Client pipeline task panicked: {}", e);
        }
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            debug!("Client pipeline task has exited");
        }
    }
}

struct Worker {
    local_user: String,
    languages: LanguagePair,
    correlator: TranslationCorrelator,
    auto_speaker: AutoSpeaker,
    queue: SynthesisQueue,
    events: mpsc::UnboundedSender<PipelineEvent>,
}

impl Worker {
    async fn run(
        mut self,
        mut speech: SpeechChannels,
        mut synthesis: mpsc::UnboundedReceiver<SynthesisEvent>,
        mut commands: mpsc::UnboundedReceiver<Command>,
    ) {
        loop {
            tokio::select! {
                Some(update) = speech.updates.recv() => self.on_speech(update).await,
                Some(kind) = speech.errors.recv() => self.emit(PipelineEvent::SpeechError(kind)),
                Some(outcome) = self.correlator.next_outcome() => {
                    if let Some(event) = self.correlator.apply(outcome) {
                        self.on_correlator(event).await;
                    }
                }
                Some(event) = synthesis.recv() => self.emit(PipelineEvent::Synthesis(event)),
                command = commands.recv() => match command {
                    Some(command) => self.on_command(command).await,
                    None => break,
                },
            }
        }

        self.queue.clear().await;
        debug!("Client pipeline task stopped");
    }

    async fn on_speech(&mut self, update: SpeechUpdate) {
        match update {
            SpeechUpdate::Interim { transcript, .. } => {
                self.emit(PipelineEvent::Interim { transcript });
            }
            SpeechUpdate::Final(utterance) => {
                let content = utterance.transcript.trim();
                if content.is_empty() {
                    return;
                }
                let events = self
                    .correlator
                    .commit(content, &self.languages, &self.local_user);
                for event in events {
                    self.on_correlator(event).await;
                }
            }
            SpeechUpdate::Ended(reason) => self.emit(PipelineEvent::ListeningEnded(reason)),
        }
    }

    async fn on_correlator(&mut self, event: CorrelatorEvent) {
        match event {
            CorrelatorEvent::Created(message) => {
                self.emit(PipelineEvent::MessageCreated(message));
            }
            CorrelatorEvent::Translated(message) => {
                if let Some(task) = self.auto_speaker.observe(&message) {
                    self.queue.enqueue(task).await;
                }
                self.emit(PipelineEvent::MessageTranslated(message));
            }
            CorrelatorEvent::Failed { message_id, error } => {
                self.emit(PipelineEvent::TranslationFailed { message_id, error });
            }
        }
    }

    async fn on_command(&mut self, command: Command) {
        match command {
            Command::SetLanguages(languages) => {
                info!("Languages changed: {} -> {}", languages.source, languages.target);
                self.languages = languages;
            }
            Command::SetAutoSpeak(enabled) => self.auto_speaker.set_enabled(enabled),
            Command::Ingest(message) => {
                self.correlator.ingest(message);
            }
            Command::ClearSpeech => {
                self.queue.clear().await;
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(self.correlator.log().messages().to_vec());
            }
        }
    }

    fn emit(&self, event: PipelineEvent) {
        let _ = self.events.send(event);
    }
}
