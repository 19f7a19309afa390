//! Single-slot, self-expiring user notifications.

use std::{sync::Arc, time::Duration};

use tokio::sync::Mutex;
use tracing::debug;

use crate::events::{UiEvent, UiEventSender};

pub const DEFAULT_MESSAGE_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayMessage {
    pub text: String,
    pub kind: MessageKind,
}

#[derive(Default)]
struct Slot {
    current: Option<DisplayMessage>,
    generation: u64,
}

/// Holds at most one message. Showing a new one replaces the old and
/// restarts the expiry; a pending expiry only clears the message it was
/// armed for.
pub struct Notifier {
    slot: Arc<Mutex<Slot>>,
    ttl: Duration,
    events: UiEventSender,
}

impl Notifier {
    pub fn new(events: UiEventSender, ttl: Duration) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Slot::default())),
            ttl,
            events,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn show(&self, text: impl Into<String>, kind: MessageKind) {
        let message = DisplayMessage {
            text: text.into(),
            kind,
        };
        let generation = {
            let mut slot = self.slot.lock().await;
            slot.generation += 1;
            slot.current = Some(message.clone());
            slot.generation
        };
        debug!(?kind, generation, "notify: message shown");
        let _ = self.events.send(UiEvent::MessageShown(message));

        let slot = Arc::clone(&self.slot);
        let events = self.events.clone();
        let ttl = self.ttl;
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            let mut slot = slot.lock().await;
            if slot.generation == generation && slot.current.take().is_some() {
                debug!(generation, "notify: message expired");
                let _ = events.send(UiEvent::MessageCleared);
            }
        });
    }

    pub async fn dismiss(&self) {
        let mut slot = self.slot.lock().await;
        slot.generation += 1;
        if slot.current.take().is_some() {
            let _ = self.events.send(UiEvent::MessageCleared);
        }
    }

    pub async fn current(&self) -> Option<DisplayMessage> {
        self.slot.lock().await.current.clone()
    }
}

#[cfg(test)]
#[path = "tests/notifier_tests.rs"]
mod tests;
