//! Snapshot fan-out to live viewers
//!
//! Every subscriber owns a single-slot channel. Publishing never blocks: if
//! a viewer has not drained the previous snapshot, the new one is skipped
//! for that viewer only. Slow viewers therefore see an undersampled stream,
//! never a delayed one, and the sampler is never held back.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::mpsc::{self, error::TryRecvError, error::TrySendError};
use tracing::{debug, trace};

use crate::model::MetricSnapshot;

pub type SharedSnapshot = Arc<MetricSnapshot>;

/// Slot count per subscriber; more would turn drops into queueing
const SLOT_CAPACITY: usize = 1;

#[derive(Default)]
struct Registry {
    next_id: AtomicU64,
    subscribers: Mutex<HashMap<u64, mpsc::Sender<SharedSnapshot>>>,
    latest: Mutex<Option<SharedSnapshot>>,
}

impl Registry {
    fn remove(&self, id: u64) -> bool {
        self.subscribers.lock().remove(&id).is_some()
    }
}

/// Cloneable handle on the subscriber registry
#[derive(Clone, Default)]
pub struct Broadcaster {
    registry: Arc<Registry>,
}

/// One viewer's end of the feed. Dropping it unsubscribes.
pub struct Subscription {
    id: u64,
    receiver: mpsc::Receiver<SharedSnapshot>,
    registry: Weak<Registry>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new viewer channel
    pub fn subscribe(&self) -> Subscription {
        let (sender, receiver) = mpsc::channel(SLOT_CAPACITY);
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        self.registry.subscribers.lock().insert(id, sender);
        debug!("Subscriber {} registered", id);

        Subscription {
            id,
            receiver,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Deregister a viewer and close its channel
    pub fn unsubscribe(&self, subscription: Subscription) {
        drop(subscription);
    }

    /// Offer a snapshot to every viewer without waiting on any of them.
    ///
    /// Returns how many viewers accepted it.
    pub fn publish(&self, snapshot: SharedSnapshot) -> usize {
        *self.registry.latest.lock() = Some(snapshot.clone());

        let subscribers = self.registry.subscribers.lock();
        let mut delivered = 0;
        for (id, sender) in subscribers.iter() {
            match sender.try_send(snapshot.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => trace!("Subscriber {} busy, snapshot skipped", id),
                Err(TrySendError::Closed(_)) => trace!("Subscriber {} closed", id),
            }
        }
        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.subscribers.lock().len()
    }

    /// Last published snapshot; the only one ever retained
    pub fn latest(&self) -> Option<SharedSnapshot> {
        self.registry.latest.lock().clone()
    }
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Wait for the next delivered snapshot; `None` once unsubscribed.
    pub async fn recv(&mut self) -> Option<SharedSnapshot> {
        self.receiver.recv().await
    }

    pub fn try_recv(&mut self) -> Result<SharedSnapshot, TryRecvError> {
        self.receiver.try_recv()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            if registry.remove(self.id) {
                debug!("Subscriber {} removed", self.id);
            }
        }
    }
}
