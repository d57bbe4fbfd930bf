use tokio::sync::broadcast;
use tracing::trace;

use crate::models::Item;

const DEFAULT_CAPACITY: usize = 256;

/// Hook invoked after an item update has been committed.
///
/// Only updates are announced; creation and deletion are not.
pub trait ItemNotifier: Send + Sync {
    fn item_updated(&self, item: &Item);
}

/// Fans committed item updates out to every live subscriber.
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<Item>,
}

impl BroadcastNotifier {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Item> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemNotifier for BroadcastNotifier {
    fn item_updated(&self, item: &Item) {
        // no subscribers is not an error
        let receivers = self.sender.send(item.clone()).unwrap_or(0);
        trace!(item_id = item.id, receivers, "item update broadcast");
    }
}
