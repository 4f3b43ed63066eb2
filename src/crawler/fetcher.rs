//! HTTP fetcher implementation
//!
//! This module handles the page requests for the crawler:
//! - Building the HTTP client, with per-scheme proxies when enabled
//! - A fixed request deadline covering connect, headers and body
//! - Classifying failures into timeout, proxy and other network errors
//!
//! Certificate validation is disabled for page fetches. Target sites with
//! broken TLS setups are still crawled; the crawler only reads public pages
//! and sends no credentials, which is the accepted trade-off.

use crate::config::{Config, ProxySettings};
use crate::FetchError;
use async_trait::async_trait;
use reqwest::{Client, Proxy};
use std::time::Duration;
use url::Url;

/// Deadline for a whole page request
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Anything that can produce the raw body of a page
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetches `url` and returns the response body
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - User agent sent with every request
/// * `proxy` - Proxy endpoints, or `None` for direct connections
/// * `timeout` - Deadline for each request
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - A proxy URL was rejected or the TLS backend failed
pub fn build_http_client(
    user_agent: &str,
    proxy: Option<&ProxySettings>,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .danger_accept_invalid_certs(true)
        .gzip(true)
        .brotli(true);

    let mut proxied = false;
    if let Some(proxy) = proxy {
        if let Some(url) = proxy.http_url() {
            builder = builder.proxy(Proxy::http(url)?);
            proxied = true;
        }
        if let Some(url) = proxy.https_url() {
            builder = builder.proxy(Proxy::https(url)?);
            proxied = true;
        }
    }

    // Without an explicit proxy, ignore HTTP_PROXY and friends from the environment
    if !proxied {
        builder = builder.no_proxy();
    }

    builder.build()
}

/// Fetches pages over HTTP
pub struct PageFetcher {
    client: Client,
    proxy_http: bool,
    proxy_https: bool,
}

impl PageFetcher {
    /// Creates a fetcher for the given configuration
    ///
    /// The proxy is used only when `proxy.enabled` is set.
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        Self::with_timeout(&config.fetch.user_agent, config.active_proxy(), FETCH_TIMEOUT)
    }

    fn with_timeout(
        user_agent: &str,
        proxy: Option<&ProxySettings>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = build_http_client(user_agent, proxy, timeout)?;
        Ok(Self {
            client,
            proxy_http: proxy.map_or(false, |p| p.http.is_some()),
            proxy_https: proxy.map_or(false, |p| p.https.is_some()),
        })
    }

    /// Returns true if requests to `url` go through a proxy
    fn is_proxied(&self, url: &Url) -> bool {
        match url.scheme() {
            "http" => self.proxy_http,
            "https" => self.proxy_https,
            _ => false,
        }
    }

    /// Maps a request failure onto the fetch error taxonomy
    ///
    /// | Condition | Error |
    /// |-----------|-------|
    /// | Deadline exceeded | Timeout |
    /// | Connect failure while proxied | Proxy |
    /// | Anything else | Network |
    fn classify(&self, url: &Url, error: reqwest::Error) -> FetchError {
        let url_str = url.to_string();
        if error.is_timeout() {
            FetchError::Timeout {
                url: url_str,
                source: error,
            }
        } else if error.is_connect() && self.is_proxied(url) {
            FetchError::Proxy {
                url: url_str,
                source: error,
            }
        } else {
            FetchError::Network {
                url: url_str,
                source: error,
            }
        }
    }
}

#[async_trait]
impl PageSource for PageFetcher {
    /// Fetches a URL and returns its body
    ///
    /// Every HTTP status counts as success here; the body of an error page
    /// is returned like any other.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let target = Url::parse(url).map_err(|source| FetchError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        tracing::debug!(url = %target, proxied = self.is_proxied(&target), "Fetching page");

        let response = self
            .client
            .get(target.clone())
            .send()
            .await
            .map_err(|e| self.classify(&target, e))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| self.classify(&target, e))?;

        tracing::debug!(
            url = %target,
            status = status.as_u16(),
            bytes = body.len(),
            "Fetched page"
        );

        Ok(body.to_vec())
    }
}
