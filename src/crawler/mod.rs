//! Crawler module for page fetching and job processing
//!
//! This module contains the core worker logic, including:
//! - HTTP fetching with optional proxies and failure classification
//! - HTML parsing and link extraction
//! - Proxy health probing
//! - Per-job processing and routing
//! - The consumer loop

mod coordinator;
mod fetcher;
mod health;
mod parser;
mod processor;

pub use coordinator::{Coordinator, CrawlStats, DEFAULT_POLL_INTERVAL};
pub use fetcher::{build_http_client, PageFetcher, PageSource, FETCH_TIMEOUT};
pub use health::{HealthProbe, ProxyHealthProbe, PROBE_TIMEOUT};
pub use parser::extract_links;
pub use processor::{Disposition, JobError, JobOutcome, JobProcessor};

use crate::config::Config;
use crate::queue::RedisChannel;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Runs a worker against the configured Redis broker
///
/// This is the main entry point for the worker. It will:
/// 1. Connect to the broker
/// 2. Build the page fetcher and proxy health probe
/// 3. Consume jobs until `shutdown` completes
///
/// # Arguments
///
/// * `config` - The validated configuration
/// * `shutdown` - Completes when the worker should stop
///
/// # Returns
///
/// * `Ok(CrawlStats)` - The worker stopped cleanly
/// * `Err(CrawlerError)` - Setup failed or the broker connection broke
pub async fn run_worker<F>(config: &Config, shutdown: F) -> crate::Result<CrawlStats>
where
    F: Future<Output = ()>,
{
    let channel = Arc::new(RedisChannel::connect(&config.queue).await?);
    let fetcher = Arc::new(PageFetcher::new(config)?);
    let probe = Arc::new(ProxyHealthProbe::new(config)?);

    let mut coordinator = Coordinator::new(channel, fetcher, probe)
        .with_poll_interval(Duration::from_millis(config.queue.poll_interval_ms));
    Ok(coordinator.run(shutdown).await?)
}
