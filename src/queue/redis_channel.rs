//! Redis-backed channel
//!
//! Every queue is a Redis list. A received message is atomically moved from
//! the inbound list onto `<inbound>:processing` and stays there until it is
//! acknowledged, so a worker that dies mid-job leaves the message visible
//! for inspection instead of losing it.

use crate::config::QueueConfig;
use crate::queue::{Channel, Delivery};
use crate::QueueResult;
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::sync::atomic::{AtomicU64, Ordering};

/// Channel consuming from and publishing to Redis lists
pub struct RedisChannel {
    connection: MultiplexedConnection,
    inbound: String,
    processing: String,
    next_tag: AtomicU64,
}

impl RedisChannel {
    /// Connects to Redis using the queue configuration
    ///
    /// # Returns
    ///
    /// * `Ok(RedisChannel)` - Connected channel
    /// * `Err(QueueError)` - The URL is invalid or the server is unreachable
    pub async fn connect(config: &QueueConfig) -> QueueResult<Self> {
        let client = redis::Client::open(config.redis_url.as_str())?;
        let connection = client.get_multiplexed_async_connection().await?;

        tracing::info!(
            inbound = %config.inbound,
            "Connected to Redis queue broker"
        );

        Ok(Self {
            connection,
            inbound: config.inbound.clone(),
            processing: processing_list(&config.inbound),
            next_tag: AtomicU64::new(0),
        })
    }
}

/// Name of the list holding received but unacknowledged messages
fn processing_list(inbound: &str) -> String {
    format!("{}:processing", inbound)
}

#[async_trait]
impl Channel for RedisChannel {
    async fn receive(&self) -> QueueResult<Option<Delivery>> {
        let mut con = self.connection.clone();
        let body: Option<Vec<u8>> = redis::cmd("LMOVE")
            .arg(&self.inbound)
            .arg(&self.processing)
            .arg("LEFT")
            .arg("RIGHT")
            .query_async(&mut con)
            .await?;

        Ok(body.map(|body| {
            let tag = self.next_tag.fetch_add(1, Ordering::SeqCst) + 1;
            Delivery::new(tag, body)
        }))
    }

    async fn ack(&self, delivery: &Delivery) -> QueueResult<()> {
        let mut con = self.connection.clone();
        let removed: i64 = con
            .lrem(&self.processing, 1, delivery.body.as_slice())
            .await?;

        if removed == 0 {
            tracing::warn!(
                delivery_tag = delivery.tag,
                "Acknowledged message was not in the processing list"
            );
        }
        Ok(())
    }

    async fn publish(&self, queue: &str, payload: &str) -> QueueResult<()> {
        let mut con = self.connection.clone();
        con.rpush::<_, _, ()>(queue, payload).await?;
        Ok(())
    }
}
