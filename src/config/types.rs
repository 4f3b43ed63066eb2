use serde::Deserialize;

/// Main configuration structure for the landing crawler
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub proxy: ProxySettings,
}

impl Config {
    /// Returns the proxy endpoints to fetch through, if the proxy is enabled
    ///
    /// A disabled toggle means no proxy is used regardless of the endpoint
    /// settings, and an enabled toggle without endpoints fetches directly.
    pub fn active_proxy(&self) -> Option<&ProxySettings> {
        if self.proxy.enabled && self.proxy.has_endpoint() {
            Some(&self.proxy)
        } else {
            None
        }
    }
}

/// Message queue configuration
#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    /// Redis connection URL
    #[serde(rename = "redis-url", default = "default_redis_url")]
    pub redis_url: String,

    /// Name of the queue jobs are consumed from
    #[serde(default = "default_inbound")]
    pub inbound: String,

    /// How long to wait before polling an empty queue again (milliseconds)
    #[serde(rename = "poll-interval-ms", default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            redis_url: default_redis_url(),
            inbound: default_inbound(),
            poll_interval_ms: default_poll_interval(),
        }
    }
}

/// Page fetch configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// User agent sent with every page request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
        }
    }
}

/// Proxy configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ProxySettings {
    /// Whether requests are routed through the proxy at all
    #[serde(default)]
    pub enabled: bool,

    /// Proxy `host:port` for plain HTTP targets
    #[serde(default)]
    pub http: Option<String>,

    /// Proxy `host:port` for HTTPS targets
    #[serde(default)]
    pub https: Option<String>,

    /// URL requested through the proxy to check that it is reachable
    #[serde(rename = "health-url", default = "default_health_url")]
    pub health_url: String,
}

impl ProxySettings {
    /// Proxy URL for plain HTTP targets
    pub fn http_url(&self) -> Option<String> {
        self.http.as_deref().map(|endpoint| format!("http://{}", endpoint))
    }

    /// Proxy URL for HTTPS targets
    pub fn https_url(&self) -> Option<String> {
        self.https
            .as_deref()
            .map(|endpoint| format!("http://{}", endpoint))
    }

    /// Returns true if at least one endpoint is set
    pub fn has_endpoint(&self) -> bool {
        self.http.is_some() || self.https.is_some()
    }
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self {
            enabled: false,
            http: None,
            https: None,
            health_url: default_health_url(),
        }
    }
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379/".to_string()
}

fn default_inbound() -> String {
    "crawler".to_string()
}

fn default_poll_interval() -> u64 {
    1000
}

fn default_user_agent() -> String {
    format!("landing-crawler/{}", env!("CARGO_PKG_VERSION"))
}

fn default_health_url() -> String {
    "https://httpbin.org/ip".to_string()
}
