//! Publisher module for book change notifications
//!
//! Owns the registry of connected subscribers and pushes order book snapshots
//! to them. Transports register a subscriber when a client connects and
//! deregister it on disconnect or error; a subscriber whose queue has closed
//! is also removed on the next publish.

use parking_lot::Mutex;
use prometheus::IntGauge;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::orderbook::PoolBookSnapshot;

/// Identifier handed out on registration
pub type SubscriberId = u64;

/// Receiving half handed to a transport for one connected client
#[derive(Debug)]
pub struct Subscription {
    pub id: SubscriberId,
    pub receiver: mpsc::Receiver<Arc<str>>,
}

/// Fire-and-forget broadcaster of book snapshots
pub struct Publisher {
    subscribers: Mutex<BTreeMap<SubscriberId, mpsc::Sender<Arc<str>>>>,
    next_id: AtomicU64,
    queue_capacity: usize,
    gauge: Option<IntGauge>,
}

impl Publisher {
    /// Create a publisher buffering up to `queue_capacity` messages per subscriber
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            subscribers: Mutex::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
            queue_capacity: queue_capacity.max(1),
            gauge: None,
        }
    }

    /// Track the subscriber count in a metrics gauge
    pub fn with_subscriber_gauge(mut self, gauge: IntGauge) -> Self {
        self.gauge = Some(gauge);
        self
    }

    /// Register a newly connected subscriber
    pub fn register(&self) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::channel(self.queue_capacity);

        let mut subscribers = self.subscribers.lock();
        subscribers.insert(id, sender);
        self.update_gauge(subscribers.len());
        drop(subscribers);

        info!(subscriber_id = id, "Subscriber registered");
        Subscription { id, receiver }
    }

    /// Remove a subscriber; returns whether it was registered
    pub fn deregister(&self, id: SubscriberId) -> bool {
        let mut subscribers = self.subscribers.lock();
        let removed = subscribers.remove(&id).is_some();
        self.update_gauge(subscribers.len());
        drop(subscribers);

        if removed {
            info!(subscriber_id = id, "Subscriber deregistered");
        }
        removed
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Broadcast snapshots to every subscriber
    ///
    /// Never waits on a subscriber: a full queue drops the message for that
    /// subscriber only. Returns the number of subscribers the message was
    /// queued for.
    pub fn publish(&self, snapshots: &[PoolBookSnapshot]) -> Result<usize> {
        let payload: Arc<str> = Arc::from(serde_json::to_string(snapshots)?);

        let mut delivered = 0;
        let mut closed = Vec::new();
        let mut subscribers = self.subscribers.lock();

        for (id, sender) in subscribers.iter() {
            match sender.try_send(payload.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    warn!(subscriber_id = *id, "Subscriber queue full, dropping snapshot");
                }
                Err(TrySendError::Closed(_)) => closed.push(*id),
            }
        }

        for id in &closed {
            subscribers.remove(id);
            debug!(subscriber_id = *id, "Removed closed subscriber");
        }
        self.update_gauge(subscribers.len());
        drop(subscribers);

        debug!(
            pools = snapshots.len(),
            delivered,
            "Published order book snapshots"
        );
        Ok(delivered)
    }

    fn update_gauge(&self, count: usize) {
        if let Some(gauge) = &self.gauge {
            gauge.set(count as i64);
        }
    }
}
