//! Consumer loop - main worker orchestration logic
//!
//! The coordinator takes deliveries off the channel one at a time and hands
//! each to the job processor, until the shutdown signal fires or the
//! channel closes. A failed job never stops the loop; a broken broker
//! connection does.

use crate::crawler::fetcher::PageSource;
use crate::crawler::health::HealthProbe;
use crate::crawler::processor::{Disposition, JobOutcome, JobProcessor};
use crate::queue::Channel;
use crate::QueueError;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Progress is logged every this many jobs
const PROGRESS_INTERVAL: u64 = 100;

/// Default wait before polling an empty queue again
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Counters for the jobs a coordinator has processed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlStats {
    /// Deliveries processed
    pub processed: u64,
    /// Jobs that published a link batch
    pub linked: u64,
    /// Links published across all batches
    pub links_published: u64,
    /// Jobs that published an empty-result signal
    pub empty: u64,
    /// Jobs that failed
    pub failed: u64,
    /// Failed jobs that produced an error report
    pub reported: u64,
    /// Deliveries whose acknowledgment failed
    pub unacknowledged: u64,
}

impl CrawlStats {
    /// Records the outcome of one job
    pub fn record(&mut self, outcome: &JobOutcome) {
        self.processed += 1;
        match outcome.disposition {
            Disposition::Linked(count) => {
                self.linked += 1;
                self.links_published += count as u64;
            }
            Disposition::Empty => self.empty += 1,
            Disposition::Failed { reported, .. } => {
                self.failed += 1;
                if reported {
                    self.reported += 1;
                }
            }
        }
        if !outcome.acknowledged {
            self.unacknowledged += 1;
        }
    }
}

/// Main worker coordinator structure
pub struct Coordinator<C, S, P>
where
    C: Channel + ?Sized,
    S: PageSource + ?Sized,
    P: HealthProbe + ?Sized,
{
    channel: Arc<C>,
    processor: JobProcessor<C, S, P>,
    poll_interval: Duration,
    stats: CrawlStats,
}

impl<C, S, P> Coordinator<C, S, P>
where
    C: Channel + ?Sized,
    S: PageSource + ?Sized,
    P: HealthProbe + ?Sized,
{
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `channel` - Channel to consume from and publish to
    /// * `source` - Fetches page bodies
    /// * `probe` - Consulted after proxy errors
    pub fn new(channel: Arc<C>, source: Arc<S>, probe: Arc<P>) -> Self {
        Self {
            processor: JobProcessor::new(channel.clone(), source, probe),
            channel,
            poll_interval: DEFAULT_POLL_INTERVAL,
            stats: CrawlStats::default(),
        }
    }

    /// Sets how long to wait before polling an empty queue again
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Counters accumulated so far
    pub fn stats(&self) -> CrawlStats {
        self.stats
    }

    /// Runs the consumer loop
    ///
    /// Shutdown is checked before each receive and while sleeping on an
    /// empty queue. A receive in flight is never cancelled, so a message
    /// taken off the queue always runs to its acknowledgment.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlStats)` - The loop stopped on shutdown or channel close
    /// * `Err(QueueError)` - Receiving from the channel failed
    pub async fn run<F>(&mut self, shutdown: F) -> Result<CrawlStats, QueueError>
    where
        F: Future<Output = ()>,
    {
        tracing::info!("Starting consumer loop");
        tokio::pin!(shutdown);

        loop {
            if self.channel.is_closed() {
                tracing::info!("Channel closed, stopping consumer loop");
                break;
            }

            let stopping = tokio::select! {
                biased;
                _ = &mut shutdown => true,
                _ = std::future::ready(()) => false,
            };
            if stopping {
                tracing::info!("Shutdown requested, stopping consumer loop");
                break;
            }

            let delivery = match self.channel.receive().await {
                Ok(Some(delivery)) => delivery,
                Ok(None) => {
                    if self.channel.is_closed() {
                        continue;
                    }
                    tokio::select! {
                        _ = &mut shutdown => {
                            tracing::info!("Shutdown requested, stopping consumer loop");
                            break;
                        }
                        _ = tokio::time::sleep(self.poll_interval) => continue,
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to receive from queue");
                    self.log_summary();
                    return Err(e);
                }
            };

            let outcome = self.processor.process(&delivery).await;
            self.stats.record(&outcome);

            if self.stats.processed % PROGRESS_INTERVAL == 0 {
                self.log_progress();
            }
        }

        self.log_summary();
        Ok(self.stats)
    }

    fn log_progress(&self) {
        tracing::info!(
            processed = self.stats.processed,
            linked = self.stats.linked,
            empty = self.stats.empty,
            failed = self.stats.failed,
            "Progress"
        );
    }

    fn log_summary(&self) {
        tracing::info!(
            processed = self.stats.processed,
            linked = self.stats.linked,
            links_published = self.stats.links_published,
            empty = self.stats.empty,
            failed = self.stats.failed,
            reported = self.stats.reported,
            unacknowledged = self.stats.unacknowledged,
            "Consumer loop finished"
        );
    }
}
