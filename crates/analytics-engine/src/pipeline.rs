//! Frame ingest: a bounded queue between the detection producer and the
//! serialized tick worker. When frames arrive faster than ticks complete,
//! the oldest unprocessed frame is evicted so the live view favors recency
//! over completeness; blocking the producer would stall the feed.

use crate::state::EngineState;
use common::detection::DetectionFrame;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{Mutex, Notify};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Bounded drop-oldest frame queue.
pub struct IngestQueue {
    capacity: usize,
    frames: Mutex<VecDeque<DetectionFrame>>,
    notify: Notify,
}

impl IngestQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            frames: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
        }
    }

    /// Enqueue a frame, evicting the oldest queued one on overflow.
    pub async fn push(&self, frame: DetectionFrame) {
        {
            let mut frames = self.frames.lock().await;
            frames.push_back(frame);
            if frames.len() > self.capacity {
                frames.pop_front();
                telemetry::metrics::INGEST_FRAMES_DROPPED.inc();
                debug!("ingest queue full; dropped oldest unprocessed frame");
            }
        }
        self.notify.notify_one();
    }

    pub async fn pop(&self) -> Option<DetectionFrame> {
        self.frames.lock().await.pop_front()
    }

    pub async fn len(&self) -> usize {
        self.frames.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.frames.lock().await.is_empty()
    }
}

/// Handle for feeding frames into the tick worker.
#[derive(Clone)]
pub struct FramePipeline {
    queue: Arc<IngestQueue>,
    shutdown: CancellationToken,
}

impl FramePipeline {
    /// Spawn the worker task draining the queue into `EngineState` ticks.
    pub fn spawn(
        state: EngineState,
        capacity: usize,
    ) -> (Self, tokio::task::JoinHandle<()>) {
        let queue = Arc::new(IngestQueue::new(capacity));
        let shutdown = CancellationToken::new();

        let worker_queue = queue.clone();
        let token = shutdown.clone();
        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        info!("frame pipeline stopped");
                        break;
                    }
                    _ = worker_queue.notify.notified() => {
                        while let Some(frame) = worker_queue.pop().await {
                            state.process_frame(frame).await;
                        }
                    }
                }
            }
        });

        (Self { queue, shutdown }, handle)
    }

    pub async fn submit(&self, frame: DetectionFrame) {
        self.queue.push(frame).await;
    }

    pub async fn queued(&self) -> usize {
        self.queue.len().await
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}
