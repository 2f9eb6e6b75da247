use tokio::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    Start,
    Stop,
}

/// Trailing-edge debouncer for start/stop requests.
///
/// Requests arriving within the collapse window of the previous one replace
/// it; only the last request is released once its window elapses. Start and
/// stop each have their own window.
#[derive(Debug, Clone)]
pub struct Debouncer {
    start_window: Duration,
    stop_window: Duration,
    pending: Option<(ControlCommand, Instant)>,
}

impl Debouncer {
    pub fn new(start_window: Duration, stop_window: Duration) -> Self {
        Self {
            start_window,
            stop_window,
            pending: None,
        }
    }

    pub fn submit(&mut self, command: ControlCommand, now: Instant) {
        let window = match command {
            ControlCommand::Start => self.start_window,
            ControlCommand::Stop => self.stop_window,
        };
        self.pending = Some((command, now + window));
    }

    /// Release the pending request if its window has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<ControlCommand> {
        match self.pending {
            Some((command, due)) if due <= now => {
                self.pending = None;
                Some(command)
            }
            _ => None,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.map(|(_, due)| due)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}
