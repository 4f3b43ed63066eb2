//! Job processor - runs one inbound job through the pipeline
//!
//! For each delivery the processor:
//! 1. Parses the job payload
//! 2. Fetches the page
//! 3. Extracts links
//! 4. Publishes a link batch, an empty-result signal, or an error report
//! 5. Acknowledges the delivery, exactly once, whatever happened before
//!
//! No error escapes `process`; failures are logged, classified and routed,
//! and a failed job is never redelivered.

use crate::crawler::fetcher::PageSource;
use crate::crawler::health::HealthProbe;
use crate::crawler::parser::extract_links;
use crate::messages::{link_batch, EmptyResultSignal, ErrorReport, Job, JobIdentity};
use crate::queue::{Channel, Delivery, MessageRouter, EMPTY_RESULT_QUEUE, ERROR_QUEUE, LINKS_QUEUE};
use crate::state::{FailureKind, JobState};
use crate::{FetchError, QueueError};
use std::sync::Arc;
use thiserror::Error;
use url::Url;

/// Why a single job failed
#[derive(Debug, Error)]
pub enum JobError {
    #[error("Invalid job payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] ::url::ParseError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Publish(#[from] QueueError),
}

impl JobError {
    /// Classifies the error for routing
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Fetch(FetchError::Timeout { .. }) => FailureKind::Timeout,
            Self::Fetch(FetchError::Proxy { .. }) => FailureKind::Proxy,
            _ => FailureKind::Generic,
        }
    }

    /// Error detail for the report message
    ///
    /// Timeout and proxy messages already say what went wrong, so they carry
    /// only the underlying transport error.
    fn detail(&self) -> String {
        match self {
            Self::Fetch(FetchError::Timeout { source, .. })
            | Self::Fetch(FetchError::Proxy { source, .. }) => source.to_string(),
            other => other.to_string(),
        }
    }
}

/// Where a job ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// A batch with this many links went to the links queue
    Linked(usize),

    /// The page had no links; an empty-result signal was published
    Empty,

    /// The job failed; `reported` is true if an error report was published
    Failed { kind: FailureKind, reported: bool },
}

/// Result of processing one delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobOutcome {
    pub disposition: Disposition,

    /// False only if the acknowledgment itself failed
    pub acknowledged: bool,
}

/// Processes inbound jobs one at a time
pub struct JobProcessor<C, S, P>
where
    C: Channel + ?Sized,
    S: PageSource + ?Sized,
    P: HealthProbe + ?Sized,
{
    channel: Arc<C>,
    router: MessageRouter<C>,
    source: Arc<S>,
    probe: Arc<P>,
}

impl<C, S, P> JobProcessor<C, S, P>
where
    C: Channel + ?Sized,
    S: PageSource + ?Sized,
    P: HealthProbe + ?Sized,
{
    /// Creates a new processor
    ///
    /// # Arguments
    ///
    /// * `channel` - Channel deliveries are acknowledged on and results published to
    /// * `source` - Fetches page bodies
    /// * `probe` - Consulted after proxy errors
    pub fn new(channel: Arc<C>, source: Arc<S>, probe: Arc<P>) -> Self {
        Self {
            router: MessageRouter::new(channel.clone()),
            channel,
            source,
            probe,
        }
    }

    /// Processes one delivery to completion and acknowledges it
    pub async fn process(&self, delivery: &Delivery) -> JobOutcome {
        let mut state = JobState::Received;
        let mut identity = JobIdentity::default();

        let disposition = match self.run(delivery, &mut identity, &mut state).await {
            Ok(disposition) => disposition,
            Err(error) => {
                self.handle_failure(delivery, &identity, error, &mut state)
                    .await
            }
        };

        let acknowledged = match self.channel.ack(delivery).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(
                    delivery_tag = delivery.tag,
                    error = %e,
                    "Failed to acknowledge message"
                );
                false
            }
        };
        advance(&mut state, JobState::Acknowledged, delivery.tag);

        JobOutcome {
            disposition,
            acknowledged,
        }
    }

    /// The success path: parse, fetch, extract, route
    async fn run(
        &self,
        delivery: &Delivery,
        identity: &mut JobIdentity,
        state: &mut JobState,
    ) -> Result<Disposition, JobError> {
        let job = Job::parse(&delivery.body, identity)?;
        tracing::debug!(
            delivery_tag = delivery.tag,
            url = %job.url,
            url_id = %job.url_id,
            "Starting to process job"
        );

        let base_url = Url::parse(&job.url)?;

        advance(state, JobState::Fetching, delivery.tag);
        let body = self.source.fetch(&job.url).await?;

        advance(state, JobState::Extracting, delivery.tag);
        let links = extract_links(&base_url, &body);
        tracing::debug!(url = %job.url, links = links.len(), "Extracted links");

        advance(state, JobState::Routing, delivery.tag);
        let disposition = if links.is_empty() {
            let payload = serde_json::to_string(&EmptyResultSignal {
                source_url_id: job.url_id.clone(),
            })?;
            self.router.publish(EMPTY_RESULT_QUEUE, &payload).await?;
            Disposition::Empty
        } else {
            let count = links.len();
            let payload = serde_json::to_string(&link_batch(&job.url_id, links))?;
            self.router.publish(LINKS_QUEUE, &payload).await?;
            Disposition::Linked(count)
        };

        tracing::debug!(url = %job.url, "Successfully processed job");
        Ok(disposition)
    }

    /// Logs a failure and publishes an error report when it warrants one
    ///
    /// Timeout and generic failures are always reported. Proxy failures are
    /// reported only when the health probe says the proxy is down.
    async fn handle_failure(
        &self,
        delivery: &Delivery,
        identity: &JobIdentity,
        error: JobError,
        state: &mut JobState,
    ) -> Disposition {
        let kind = error.kind();
        advance(state, JobState::Failed(kind), delivery.tag);

        let url = identity.url.as_deref().unwrap_or("<unknown>");
        let error_message = match kind {
            FailureKind::Timeout => {
                format!("Failed to process {}: Request timed out. {}", url, error.detail())
            }
            FailureKind::Proxy => {
                format!("Failed to process {}: Proxy error. {}", url, error.detail())
            }
            FailureKind::Generic => format!("Failed to process {}: {}", url, error.detail()),
        };

        tracing::error!(
            delivery_tag = delivery.tag,
            url,
            url_id = ?identity.url_id,
            kind = %kind,
            "{}",
            error_message
        );

        let escalate = match kind {
            FailureKind::Proxy => {
                let healthy = self.probe.is_healthy().await;
                if healthy {
                    tracing::warn!(url, "Proxy reports healthy, treating proxy error as transient");
                }
                !healthy
            }
            FailureKind::Timeout | FailureKind::Generic => true,
        };

        let reported = escalate && self.report(identity, error_message).await;
        Disposition::Failed { kind, reported }
    }

    /// Publishes an error report, returning true on success
    async fn report(&self, identity: &JobIdentity, error_message: String) -> bool {
        let report = ErrorReport::new(identity, error_message);

        let payload = match serde_json::to_string(&report) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize error report");
                return false;
            }
        };

        match self.router.publish(ERROR_QUEUE, &payload).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(
                    url = ?identity.url,
                    error = %e,
                    "Failed to publish error report"
                );
                false
            }
        }
    }
}

/// Moves a job to its next state, logging the transition
fn advance(state: &mut JobState, next: JobState, delivery_tag: u64) {
    if !state.can_transition_to(next) {
        tracing::warn!(delivery_tag, from = %state, to = %next, "Unexpected job state transition");
    }
    tracing::debug!(delivery_tag, from = %state, to = %next, "Job state transition");
    *state = next;
}
