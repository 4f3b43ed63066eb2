//! Message queue module
//!
//! This module defines the channel interface the crawler consumes jobs from
//! and publishes results to, along with its implementations:
//!
//! - `MemoryChannel`: in-process queues that record every publish and ack
//! - `RedisChannel`: Redis lists used as work queues
//! - `MessageRouter`: publishes serialized payloads to named queues

mod memory;
mod redis_channel;
mod router;

pub use memory::MemoryChannel;
pub use redis_channel::RedisChannel;
pub use router::MessageRouter;

use crate::QueueResult;
use async_trait::async_trait;

/// Queue receiving every non-empty link batch
pub const LINKS_QUEUE: &str = "landing_crawler";

/// Queue receiving jobs whose page yielded no links
pub const EMPTY_RESULT_QUEUE: &str = "landing_crawler_goose";

/// Queue receiving error reports for failed jobs
pub const ERROR_QUEUE: &str = "error_crawler";

/// A message received from the inbound queue, awaiting acknowledgment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Channel-assigned tag, unique per channel instance
    pub tag: u64,

    /// Raw message body
    pub body: Vec<u8>,
}

impl Delivery {
    pub fn new(tag: u64, body: impl Into<Vec<u8>>) -> Self {
        Self {
            tag,
            body: body.into(),
        }
    }
}

/// Trait for queue channel implementations
///
/// A channel hands out deliveries from one inbound queue, acknowledges them,
/// and publishes payloads to any named queue.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Receives the next delivery
    ///
    /// Returns `Ok(None)` when no message became available; callers should
    /// check [`Channel::is_closed`] before asking again.
    async fn receive(&self) -> QueueResult<Option<Delivery>>;

    /// Marks a delivery as consumed so it is never redelivered
    async fn ack(&self, delivery: &Delivery) -> QueueResult<()>;

    /// Publishes an already-serialized payload to a queue
    async fn publish(&self, queue: &str, payload: &str) -> QueueResult<()>;

    /// Returns true once the channel will never produce another delivery
    fn is_closed(&self) -> bool {
        false
    }
}
