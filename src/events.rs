use parking_lot::RwLock;
use tracing::trace;

use crate::protocol::SessionEvent;

/// Receives session notifications in emission order.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: SessionEvent);
}

/// Fans events out to any number of channel subscribers.
///
/// Subscribers whose receiver has been dropped are pruned on the next emit.
#[derive(Default)]
pub struct EventBus {
    subscribers: RwLock<Vec<flume::Sender<SessionEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> flume::Receiver<SessionEvent> {
        let (tx, rx) = flume::unbounded();
        self.subscribers.write().push(tx);
        rx
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

impl EventSink for EventBus {
    fn emit(&self, event: SessionEvent) {
        trace!("[{}] emit {}", event.guild_id(), event.name());
        let mut subscribers = self.subscribers.write();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}
