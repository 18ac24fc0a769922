//! Fan-out of published events to every connected subscriber.
//!
//! Each subscriber owns a bounded queue. `publish` encodes the event once and
//! `try_send`s the shared frame into every queue, so a slow or dead
//! subscriber never blocks the publisher or the other subscribers:
//! - queue full   → subscriber evicted (counted); its stream ends after the
//!   queued frames, so the connection closes and the client reloads
//! - queue closed → subscriber pruned from the fan-out set
//!
//! A subscriber is never left connected after missing a frame.
//!
//! Frames for one subscriber arrive in publish order.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use serde::Serialize;
use tokio::sync::{mpsc, RwLock};
use tokio::sync::mpsc::error::TrySendError;
use uuid::Uuid;

use crate::protocol::{Envelope, ProtocolError};

/// A pre-encoded JSON text frame shared by all receivers.
pub type Frame = Arc<str>;

/// Opaque subscriber identity.
pub type SubscriberId = Uuid;

/// Statistics for monitoring broadcast health.
#[derive(Debug, Clone, Default)]
pub struct BroadcastStats {
    pub messages_published: u64,
    pub frames_delivered: u64,
    pub frames_dropped: u64,
    pub active_subscribers: usize,
}

/// Lock-free counters, read via [`BroadcastHub::stats`].
struct AtomicBroadcastStats {
    messages_published: AtomicU64,
    frames_delivered: AtomicU64,
    frames_dropped: AtomicU64,
}

impl AtomicBroadcastStats {
    fn new() -> Self {
        Self {
            messages_published: AtomicU64::new(0),
            frames_delivered: AtomicU64::new(0),
            frames_dropped: AtomicU64::new(0),
        }
    }
}

/// Receiving half handed to a new subscriber.
pub struct Subscription {
    id: SubscriberId,
    rx: mpsc::Receiver<Frame>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Next frame, or `None` once the hub dropped this subscriber.
    pub async fn recv(&mut self) -> Option<Frame> {
        self.rx.recv().await
    }

    /// Non-blocking receive, for tests and draining.
    pub fn try_recv(&mut self) -> Option<Frame> {
        self.rx.try_recv().ok()
    }
}

/// The set of live subscribers.
pub struct BroadcastHub {
    subscribers: RwLock<HashMap<SubscriberId, mpsc::Sender<Frame>>>,
    /// Per-subscriber queue depth
    capacity: usize,
    atomic_stats: AtomicBroadcastStats,
}

impl BroadcastHub {
    /// `capacity` is how many frames may queue for one subscriber before
    /// further frames to it are dropped.
    pub fn new(capacity: usize) -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
            atomic_stats: AtomicBroadcastStats::new(),
        }
    }

    /// Register a new subscriber.
    pub async fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::channel(self.capacity);
        let id = Uuid::new_v4();
        self.subscribers.write().await.insert(id, tx);
        log::debug!("Subscriber {id} added");
        Subscription { id, rx }
    }

    /// Remove a subscriber. Unknown ids are a no-op.
    pub async fn unsubscribe(&self, id: &SubscriberId) -> bool {
        let removed = self.subscribers.write().await.remove(id).is_some();
        if removed {
            log::debug!("Subscriber {id} removed");
        }
        removed
    }

    /// Publish `payload` under `event` to every current subscriber.
    ///
    /// Returns the number of subscribers the frame was queued for. Per
    /// subscriber failures are logged and counted, never returned.
    pub async fn publish<T: Serialize + ?Sized>(
        &self,
        event: &str,
        payload: &T,
    ) -> Result<usize, ProtocolError> {
        let frame: Frame = Envelope::from_payload(event, payload)?.encode()?.into();
        Ok(self.publish_frame(frame).await)
    }

    /// Fan out an already-encoded frame.
    pub async fn publish_frame(&self, frame: Frame) -> usize {
        let mut delivered = 0usize;
        let mut dropped = 0u64;
        let mut evicted = Vec::new();

        {
            let subscribers = self.subscribers.read().await;
            for (id, tx) in subscribers.iter() {
                match tx.try_send(frame.clone()) {
                    Ok(()) => delivered += 1,
                    Err(TrySendError::Full(_)) => {
                        dropped += 1;
                        log::warn!("Subscriber {id} lagging, disconnecting");
                        evicted.push(*id);
                    }
                    Err(TrySendError::Closed(_)) => evicted.push(*id),
                }
            }
        }

        if !evicted.is_empty() {
            let mut subscribers = self.subscribers.write().await;
            for id in &evicted {
                subscribers.remove(id);
                log::debug!("Pruned subscriber {id}");
            }
        }

        self.atomic_stats.messages_published.fetch_add(1, Ordering::Relaxed);
        self.atomic_stats
            .frames_delivered
            .fetch_add(delivered as u64, Ordering::Relaxed);
        self.atomic_stats.frames_dropped.fetch_add(dropped, Ordering::Relaxed);

        delivered
    }

    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.read().await.len()
    }

    pub async fn has_subscriber(&self, id: &SubscriberId) -> bool {
        self.subscribers.read().await.contains_key(id)
    }

    pub async fn stats(&self) -> BroadcastStats {
        BroadcastStats {
            messages_published: self.atomic_stats.messages_published.load(Ordering::Relaxed),
            frames_delivered: self.atomic_stats.frames_delivered.load(Ordering::Relaxed),
            frames_dropped: self.atomic_stats.frames_dropped.load(Ordering::Relaxed),
            active_subscribers: self.subscriber_count().await,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
