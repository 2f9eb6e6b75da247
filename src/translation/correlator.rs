use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::fallback::Translator;
use super::provider::{TranslateParams, TranslationResponse};
use crate::conversation::{ApplyError, ConversationLog, LanguagePair, Message};
use crate::error::TranslationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranslationStatus {
    Pending,
    Complete,
    Failed,
}

/// In-flight translation for one message. `from`/`to` never change once
/// issued. Dropped as soon as the message settles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationRequest {
    pub message_id: String,
    pub text: String,
    pub from: String,
    pub to: String,
}

/// Result of an in-flight translation, addressed by message id
#[derive(Debug, Clone)]
pub struct TranslationOutcome {
    pub message_id: String,
    pub result: Result<TranslationResponse, TranslationError>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CorrelatorEvent {
    /// Message inserted with empty translation fields
    Created(Message),

    /// Message acquired its translation (emitted once per message)
    Translated(Message),

    /// Translation failed; the message keeps its original content
    Failed {
        message_id: String,
        error: TranslationError,
    },
}

/// Turns committed transcripts into messages and correlates their
/// asynchronous translations back by message id.
pub struct TranslationCorrelator {
    translator: Arc<Translator>,
    log: ConversationLog,
    requests: HashMap<String, TranslationRequest>,
    outcomes_tx: mpsc::UnboundedSender<TranslationOutcome>,
    outcomes_rx: mpsc::UnboundedReceiver<TranslationOutcome>,
}

impl TranslationCorrelator {
    pub fn new(translator: Arc<Translator>) -> Self {
        let (outcomes_tx, outcomes_rx) = mpsc::unbounded_channel();
        Self {
            translator,
            log: ConversationLog::new(),
            requests: HashMap::new(),
            outcomes_tx,
            outcomes_rx,
        }
    }

    /// Create a message for `content` and issue its translation.
    ///
    /// The language pair is copied onto the message here; later language
    /// changes do not affect this message. Same-language messages are
    /// settled immediately without calling the translator.
    pub fn commit(
        &mut self,
        content: &str,
        languages: &LanguagePair,
        author_id: &str,
    ) -> Vec<CorrelatorEvent> {
        let message = Message::new(content, languages, author_id);
        let message_id = message.id.clone();
        let context = self.log.messages().last().map(|m| m.content.clone());

        self.log.insert(message.clone());
        let mut events = vec![CorrelatorEvent::Created(message)];

        let request = TranslationRequest {
            message_id: message_id.clone(),
            text: content.to_string(),
            from: languages.source.clone(),
            to: languages.target.clone(),
        };

        if languages.is_identity() {
            self.requests.insert(message_id.clone(), request);
            let params = TranslateParams::new(content, languages);
            let outcome = TranslationOutcome {
                message_id,
                result: Ok(TranslationResponse::passthrough(&params)),
            };
            events.extend(self.apply(outcome));
            return events;
        }

        let params = TranslateParams {
            context,
            ..TranslateParams::new(content, languages)
        };
        self.requests.insert(message_id.clone(), request);

        debug!(
            "Issuing translation for {} ({} -> {})",
            message_id, params.from, params.to
        );

        let translator = Arc::clone(&self.translator);
        let outcomes = self.outcomes_tx.clone();
        tokio::spawn(async move {
            let result = translator.translate(&params).await;
            // Receiver gone means the correlator was dropped; nothing to update
            let _ = outcomes.send(TranslationOutcome { message_id, result });
        });

        events
    }

    /// Wait for the next translation result.
    pub async fn next_outcome(&mut self) -> Option<TranslationOutcome> {
        self.outcomes_rx.recv().await
    }

    /// Apply a translation result to its message.
    ///
    /// Returns `None` for results that do not match a pending request
    /// (unknown id, or a duplicate for an already-settled message).
    pub fn apply(&mut self, outcome: TranslationOutcome) -> Option<CorrelatorEvent> {
        let Some(request) = self.requests.remove(&outcome.message_id) else {
            debug!(
                "Discarding translation for unknown or settled message {}",
                outcome.message_id
            );
            return None;
        };

        match outcome.result {
            Ok(response) => {
                match self.log.apply_translation(
                    &outcome.message_id,
                    response.translated_text,
                    response.confidence,
                ) {
                    Ok(message) => {
                        info!(
                            "Message {} translated ({} -> {})",
                            message.id, request.from, request.to
                        );
                        Some(CorrelatorEvent::Translated(message.clone()))
                    }
                    Err(e) => {
                        warn!("Could not apply translation: {}", e);
                        None
                    }
                }
            }
            Err(error) => match self.log.mark_failed(&outcome.message_id, error.to_string()) {
                Ok(_) => {
                    warn!("Translation failed for message {}: {}", outcome.message_id, error);
                    Some(CorrelatorEvent::Failed {
                        message_id: outcome.message_id,
                        error,
                    })
                }
                Err(ApplyError::AlreadySettled(id)) | Err(ApplyError::NotFound(id)) => {
                    warn!("Could not record translation failure for {}", id);
                    None
                }
            },
        }
    }

    /// Add a message authored elsewhere (e.g. another participant).
    pub fn ingest(&mut self, message: Message) -> bool {
        self.log.insert(message)
    }

    /// The in-flight request for `message_id`, if it has not settled yet.
    pub fn request(&self, message_id: &str) -> Option<&TranslationRequest> {
        self.requests.get(message_id)
    }

    /// Translation status of a logged message, read off the message itself
    /// once it has settled.
    pub fn status(&self, message_id: &str) -> Option<TranslationStatus> {
        if self.requests.contains_key(message_id) {
            return Some(TranslationStatus::Pending);
        }
        let message = self.log.get(message_id)?;
        Some(if message.translation_error.is_some() {
            TranslationStatus::Failed
        } else if message.translated_content.is_some() {
            TranslationStatus::Complete
        } else {
            TranslationStatus::Pending
        })
    }

    pub fn pending_count(&self) -> usize {
        self.requests.len()
    }

    pub fn log(&self) -> &ConversationLog {
        &self.log
    }
}
