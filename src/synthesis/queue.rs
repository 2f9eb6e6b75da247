use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::capability::{SynthesisCapability, SynthesisTask, Synthesizer};
use crate::error::SynthesisError;

/// Playback notifications, in order. `Started` is always followed by exactly
/// one of the other three before the next `Started`.
#[derive(Debug, Clone, PartialEq)]
pub enum SynthesisEvent {
    Started { text: String },
    Finished { text: String },
    Failed { text: String, error: SynthesisError },
    Cancelled { text: String },
}

struct Shared {
    pending: Mutex<VecDeque<SynthesisTask>>,
    wake: Notify,
    speaking: AtomicBool,
    /// Bumped by `clear`, under the `pending` lock
    cancel: watch::Sender<u64>,
}

/// FIFO of synthesis tasks with strictly sequential playback
pub struct SynthesisQueue {
    shared: Option<Arc<Shared>>,
    worker: Option<JoinHandle<()>>,
}

impl SynthesisQueue {
    pub fn new(capability: SynthesisCapability) -> (Self, mpsc::UnboundedReceiver<SynthesisEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let synthesizer = match capability {
            SynthesisCapability::Available(synthesizer) => synthesizer,
            SynthesisCapability::Unavailable => {
                warn!("Speech synthesis unavailable; queued text will not be spoken");
                return (
                    Self {
                        shared: None,
                        worker: None,
                    },
                    events_rx,
                );
            }
        };

        info!("Synthesis queue using {}", synthesizer.name());

        let (cancel, _) = watch::channel(0);
        let shared = Arc::new(Shared {
            pending: Mutex::new(VecDeque::new()),
            wake: Notify::new(),
            speaking: AtomicBool::new(false),
            cancel,
        });

        let worker = tokio::spawn(run(Arc::clone(&shared), synthesizer, events_tx));

        (
            Self {
                shared: Some(shared),
                worker: Some(worker),
            },
            events_rx,
        )
    }

    pub fn is_supported(&self) -> bool {
        self.shared.is_some()
    }

    /// Append a task. Returns false when synthesis is unsupported.
    pub async fn enqueue(&self, task: SynthesisTask) -> bool {
        let Some(shared) = &self.shared else {
            return false;
        };

        let depth = {
            let mut pending = shared.pending.lock().await;
            pending.push_back(task);
            pending.len()
        };
        shared.wake.notify_one();

        debug!("Synthesis task queued ({} pending)", depth);
        true
    }

    /// Cancel the utterance in progress and discard everything queued.
    ///
    /// Returns the number of queued tasks discarded.
    pub async fn clear(&self) -> usize {
        let Some(shared) = &self.shared else {
            return 0;
        };

        let mut pending = shared.pending.lock().await;
        let discarded = pending.len();
        pending.clear();
        shared.cancel.send_modify(|generation| *generation += 1);
        drop(pending);

        if discarded > 0 {
            info!("Synthesis queue cleared ({} discarded)", discarded);
        }
        discarded
    }

    pub fn is_speaking(&self) -> bool {
        self.shared
            .as_ref()
            .is_some_and(|shared| shared.speaking.load(Ordering::SeqCst))
    }

    /// Tasks waiting behind the current utterance
    pub async fn len(&self) -> usize {
        match &self.shared {
            Some(shared) => shared.pending.lock().await.len(),
            None => 0,
        }
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Drop for SynthesisQueue {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.abort();
        }
    }
}

async fn run(
    shared: Arc<Shared>,
    synthesizer: Arc<dyn Synthesizer>,
    events: mpsc::UnboundedSender<SynthesisEvent>,
) {
    let mut cancel = shared.cancel.subscribe();

    loop {
        let task = loop {
            {
                let mut pending = shared.pending.lock().await;
                if let Some(task) = pending.pop_front() {
                    // Clears before this point already dropped the task; mark
                    // them seen so only later clears cancel it
                    cancel.borrow_and_update();
                    break task;
                }
            }
            shared.wake.notified().await;
        };

        shared.speaking.store(true, Ordering::SeqCst);
        let _ = events.send(SynthesisEvent::Started {
            text: task.text.clone(),
        });

        let outcome = tokio::select! {
            result = synthesizer.speak(&task) => match result {
                Ok(()) => SynthesisEvent::Finished { text: task.text },
                Err(SynthesisError::Cancelled) => SynthesisEvent::Cancelled { text: task.text },
                Err(error) => {
                    warn!("Synthesis failed: {}", error);
                    SynthesisEvent::Failed { text: task.text, error }
                }
            },
            _ = cancel.changed() => {
                synthesizer.cancel().await;
                SynthesisEvent::Cancelled { text: task.text }
            }
        };

        shared.speaking.store(false, Ordering::SeqCst);
        let _ = events.send(outcome);
    }
}
