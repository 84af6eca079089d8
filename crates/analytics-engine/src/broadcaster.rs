//! Fan-out of per-tick snapshots to live subscribers.
//!
//! Each subscriber gets its own bounded channel so one slow or disconnected
//! consumer can never stall tick processing. Delivery is fire-and-forget: a
//! full buffer loses the event (drop-newest), a closed channel removes the
//! subscriber.

use common::analytics::LiveSnapshot;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tokio::sync::RwLock;
use uuid::Uuid;

pub struct Broadcaster {
    buffer_capacity: usize,
    subscribers: RwLock<HashMap<Uuid, mpsc::Sender<LiveSnapshot>>>,
}

impl Broadcaster {
    pub fn new(buffer_capacity: usize) -> Self {
        Self {
            buffer_capacity: buffer_capacity.max(1),
            subscribers: RwLock::new(HashMap::new()),
        }
    }

    pub async fn subscribe(&self) -> (Uuid, mpsc::Receiver<LiveSnapshot>) {
        let (tx, rx) = mpsc::channel(self.buffer_capacity);
        let id = Uuid::new_v4();
        let mut subscribers = self.subscribers.write().await;
        subscribers.insert(id, tx);
        telemetry::metrics::LIVE_SUBSCRIBERS.set(subscribers.len() as i64);
        (id, rx)
    }

    pub async fn unsubscribe(&self, id: Uuid) {
        let mut subscribers = self.subscribers.write().await;
        subscribers.remove(&id);
        telemetry::metrics::LIVE_SUBSCRIBERS.set(subscribers.len() as i64);
    }

    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.read().await.len()
    }

    /// Publish one tick's snapshot to every subscriber without awaiting any
    /// of them.
    pub async fn publish(&self, snapshot: &LiveSnapshot) {
        let mut closed = Vec::new();
        {
            let subscribers = self.subscribers.read().await;
            for (id, tx) in subscribers.iter() {
                match tx.try_send(snapshot.clone()) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        telemetry::metrics::LIVE_EVENTS_DROPPED.inc();
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => closed.push(*id),
                }
            }
        }

        if !closed.is_empty() {
            let mut subscribers = self.subscribers.write().await;
            for id in closed {
                subscribers.remove(&id);
            }
            telemetry::metrics::LIVE_SUBSCRIBERS.set(subscribers.len() as i64);
        }
    }
}
