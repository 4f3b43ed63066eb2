//! Proxy health probing
//!
//! After a proxy error the processor asks a probe whether the proxy is
//! currently reachable. Only an unhealthy proxy turns the error into an
//! error report; a healthy one means the failure was transient.

use crate::config::Config;
use crate::crawler::fetcher::build_http_client;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Deadline for a single health probe request
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Reports whether the configured proxy is currently usable
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn is_healthy(&self) -> bool;
}

/// Probes the proxy by requesting a known URL through it
pub struct ProxyHealthProbe {
    /// `None` when no proxy is in use
    client: Option<Client>,
    health_url: String,
}

impl ProxyHealthProbe {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let client = config
            .active_proxy()
            .map(|proxy| build_http_client(&config.fetch.user_agent, Some(proxy), PROBE_TIMEOUT))
            .transpose()?;

        Ok(Self {
            client,
            health_url: config.proxy.health_url.clone(),
        })
    }
}

#[async_trait]
impl HealthProbe for ProxyHealthProbe {
    /// Healthy when the probe request completes without a server error
    ///
    /// Always healthy when no proxy is configured.
    async fn is_healthy(&self) -> bool {
        let Some(client) = &self.client else {
            return true;
        };

        match client.get(&self.health_url).send().await {
            Ok(response) => {
                let status = response.status();
                tracing::debug!(
                    health_url = %self.health_url,
                    status = status.as_u16(),
                    "Proxy health probe completed"
                );
                !status.is_server_error()
            }
            Err(e) => {
                tracing::warn!(
                    health_url = %self.health_url,
                    error = %e,
                    "Proxy health probe failed"
                );
                false
            }
        }
    }
}
