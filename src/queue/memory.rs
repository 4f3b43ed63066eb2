//! In-memory channel
//!
//! Keeps the inbound queue in a `VecDeque` and records every publish and
//! acknowledgment so callers can inspect exactly what a worker did. Used by
//! the test suite and for running the pipeline without a broker.

use crate::queue::{Channel, Delivery};
use crate::{QueueError, QueueResult};
use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::RwLock;

/// A payload published to a named queue
#[derive(Debug, Clone, PartialEq, Eq)]
struct PublishedMessage {
    queue: String,
    payload: String,
}

/// Channel backed by in-process queues
#[derive(Default)]
pub struct MemoryChannel {
    inbound: RwLock<VecDeque<Delivery>>,
    next_tag: AtomicU64,
    closed: AtomicBool,
    published: RwLock<Vec<PublishedMessage>>,
    acked: RwLock<Vec<u64>>,
    failing_queues: RwLock<HashSet<String>>,
}

impl MemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a message body to the inbound queue and returns its tag
    pub fn push(&self, body: impl Into<Vec<u8>>) -> u64 {
        let tag = self.next_tag.fetch_add(1, Ordering::SeqCst) + 1;
        self.inbound
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Delivery::new(tag, body));
        tag
    }

    /// Stops accepting new messages; the channel closes once drained
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    /// Makes every later publish to `queue` fail
    pub fn fail_publishes_to(&self, queue: &str) {
        self.failing_queues
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(queue.to_string());
    }

    /// Number of deliveries still waiting in the inbound queue
    pub fn pending(&self) -> usize {
        self.inbound
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Get the payloads published to a specific queue
    pub fn messages_for_queue(&self, queue: &str) -> Vec<String> {
        self.published
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|m| m.queue == queue)
            .map(|m| m.payload.clone())
            .collect()
    }

    /// Get the count of published messages
    pub fn publish_count(&self) -> usize {
        self.published
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Get the tags of all acknowledged deliveries, in ack order
    pub fn acked_tags(&self) -> Vec<u64> {
        self.acked
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Number of times the delivery with `tag` was acknowledged
    pub fn ack_count(&self, tag: u64) -> usize {
        self.acked
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|&&t| t == tag)
            .count()
    }
}

#[async_trait]
impl Channel for MemoryChannel {
    async fn receive(&self) -> QueueResult<Option<Delivery>> {
        Ok(self
            .inbound
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front())
    }

    async fn ack(&self, delivery: &Delivery) -> QueueResult<()> {
        self.acked
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(delivery.tag);
        Ok(())
    }

    async fn publish(&self, queue: &str, payload: &str) -> QueueResult<()> {
        let failing = self
            .failing_queues
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains(queue);
        if failing {
            return Err(QueueError::Publish {
                queue: queue.to_string(),
                message: "publish rejected".to_string(),
            });
        }

        self.published
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(PublishedMessage {
                queue: queue.to_string(),
                payload: payload.to_string(),
            });
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst) && self.pending() == 0
    }
}
