use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};

use crate::address::{is_valid_address, normalize_address};

pub const DEFAULT_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressEvent {
    /// Input became empty.
    Cleared,
    /// Input settled on a valid address (normalized).
    Accepted(String),
    Rejected(String),
}

/// Validates typed address input once it stops changing for `delay`.
///
/// Each `push` cancels whatever validation is still pending for the previous
/// input before scheduling a new one.
pub struct AddressDebouncer {
    delay: Duration,
    events: mpsc::UnboundedSender<AddressEvent>,
    pending: Option<JoinHandle<()>>,
}

impl AddressDebouncer {
    pub fn new(delay: Duration) -> (Self, mpsc::UnboundedReceiver<AddressEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        (
            Self {
                delay,
                events,
                pending: None,
            },
            rx,
        )
    }

    pub fn push(&mut self, input: &str) {
        self.cancel();

        let input = input.trim().to_string();
        if input.is_empty() {
            let _ = self.events.send(AddressEvent::Cleared);
            return;
        }
        if !input.starts_with("0x") {
            let _ = self
                .events
                .send(AddressEvent::Rejected("Address must start with 0x".to_string()));
            return;
        }

        let events = self.events.clone();
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            sleep(delay).await;
            let event = if is_valid_address(&input) {
                AddressEvent::Accepted(normalize_address(&input))
            } else {
                AddressEvent::Rejected("Invalid Ethereum address format".to_string())
            };
            let _ = events.send(event);
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl Drop for AddressDebouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
