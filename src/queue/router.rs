use crate::queue::Channel;
use crate::QueueResult;
use std::sync::Arc;

/// Publishes serialized payloads to named downstream queues
///
/// The router does not serialize anything itself and does not recover from
/// a failed publish; the error is returned to the caller.
pub struct MessageRouter<C: Channel + ?Sized> {
    channel: Arc<C>,
}

impl<C: Channel + ?Sized> MessageRouter<C> {
    pub fn new(channel: Arc<C>) -> Self {
        Self { channel }
    }

    /// Publishes `payload` to the queue named `queue`
    pub async fn publish(&self, queue: &str, payload: &str) -> QueueResult<()> {
        self.channel.publish(queue, payload).await?;
        tracing::info!(queue, payload, "Sent to {} queue", queue);
        Ok(())
    }
}
