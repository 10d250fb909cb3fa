//! Log line fan-out to push-channel subscribers.
//!
//! Each subscriber owns an independent bounded queue. Publishing never waits:
//! a subscriber whose queue is full or whose receiver is gone is dropped on
//! the spot, and everyone else keeps receiving.
//!
//! The relay must not emit `log` records itself. It is normally the sink of
//! the process logger, and logging from inside `publish` would re-enter it.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Default number of recent lines kept for seeding new subscribers.
pub const DEFAULT_LOG_CAPACITY: usize = 100;
/// Default per-subscriber queue depth.
pub const DEFAULT_SUBSCRIBER_QUEUE: usize = 64;

pub type SubscriberId = u64;

/// Handle returned by [`LogRelay::subscribe`].
#[derive(Debug)]
pub struct Subscription {
    pub id: SubscriberId,
    pub receiver: mpsc::Receiver<String>,
}

struct RelayInner {
    recent: VecDeque<String>,
    subscribers: Vec<(SubscriberId, mpsc::Sender<String>)>,
}

/// Bounded recent-log buffer plus live subscriber set.
pub struct LogRelay {
    inner: Mutex<RelayInner>,
    capacity: usize,
    queue_depth: usize,
    next_id: AtomicU64,
    dropped: AtomicU64,
}

impl LogRelay {
    pub fn new(capacity: usize, queue_depth: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Mutex::new(RelayInner {
                recent: VecDeque::with_capacity(capacity),
                subscribers: Vec::new(),
            }),
            capacity,
            queue_depth: queue_depth.max(1),
            next_id: AtomicU64::new(1),
            dropped: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RelayInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a line and forward it to every live subscriber.
    ///
    /// Returns the number of subscribers that received it.
    pub fn publish(&self, line: impl Into<String>) -> usize {
        let mut line = line.into();
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }

        let mut inner = self.lock();
        if inner.recent.len() == self.capacity {
            inner.recent.pop_front();
        }
        inner.recent.push_back(line.clone());

        let before = inner.subscribers.len();
        inner
            .subscribers
            .retain(|(_, tx)| match tx.try_send(line.clone()) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) | Err(TrySendError::Closed(_)) => false,
            });
        let delivered = inner.subscribers.len();
        drop(inner);

        let dropped = (before - delivered) as u64;
        if dropped > 0 {
            self.dropped.fetch_add(dropped, Ordering::Relaxed);
        }
        delivered
    }

    /// Subscribe to lines published from now on. No replay.
    pub fn subscribe(&self) -> Subscription {
        self.subscribe_with_seed(0)
    }

    /// Subscribe and pre-load the queue with the most recent lines.
    ///
    /// At most half the queue is seeded so live lines still fit behind it.
    pub fn subscribe_seeded(&self) -> Subscription {
        self.subscribe_with_seed(self.queue_depth / 2)
    }

    fn subscribe_with_seed(&self, seed: usize) -> Subscription {
        let (tx, receiver) = mpsc::channel(self.queue_depth);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        // Seed and register under one lock so no line is lost or duplicated.
        let mut inner = self.lock();
        let skip = inner.recent.len().saturating_sub(seed);
        for line in inner.recent.iter().skip(skip) {
            // Cannot fail: fresh channel, seed < queue depth.
            let _ = tx.try_send(line.clone());
        }
        inner.subscribers.push((id, tx));
        Subscription { id, receiver }
    }

    /// Remove a subscriber. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let mut inner = self.lock();
        let before = inner.subscribers.len();
        inner.subscribers.retain(|(sid, _)| *sid != id);
        inner.subscribers.len() != before
    }

    pub fn is_subscribed(&self, id: SubscriberId) -> bool {
        self.lock().subscribers.iter().any(|(sid, _)| *sid == id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    /// Copy of the recent-log buffer, oldest first.
    pub fn recent(&self) -> Vec<String> {
        self.lock().recent.iter().cloned().collect()
    }

    /// Subscribers dropped for being slow or disconnected since start.
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Default for LogRelay {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY, DEFAULT_SUBSCRIBER_QUEUE)
    }
}
