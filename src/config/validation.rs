use crate::config::types::{Config, ProxySettings, QueueConfig};
use crate::queue::{EMPTY_RESULT_QUEUE, ERROR_QUEUE, LINKS_QUEUE};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_queue_config(&config.queue)?;
    validate_user_agent(&config.fetch.user_agent)?;
    validate_proxy_settings(&config.proxy)?;
    Ok(())
}

/// Validates queue configuration
fn validate_queue_config(config: &QueueConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.redis_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid redis-url: {}", e)))?;

    if url.scheme() != "redis" && url.scheme() != "rediss" {
        return Err(ConfigError::InvalidUrl(format!(
            "redis-url must use the redis:// or rediss:// scheme, got '{}'",
            config.redis_url
        )));
    }

    if config.inbound.trim().is_empty() {
        return Err(ConfigError::Validation(
            "inbound queue name cannot be empty".to_string(),
        ));
    }

    if [LINKS_QUEUE, EMPTY_RESULT_QUEUE, ERROR_QUEUE].contains(&config.inbound.as_str()) {
        return Err(ConfigError::Validation(format!(
            "inbound queue cannot be the outbound queue '{}'",
            config.inbound
        )));
    }

    if config.poll_interval_ms < 10 || config.poll_interval_ms > 60_000 {
        return Err(ConfigError::Validation(format!(
            "poll-interval-ms must be between 10 and 60000, got {}",
            config.poll_interval_ms
        )));
    }

    Ok(())
}

fn validate_user_agent(user_agent: &str) -> Result<(), ConfigError> {
    if user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates proxy settings
///
/// Endpoints are only checked when the proxy is enabled, since they are
/// ignored otherwise.
fn validate_proxy_settings(config: &ProxySettings) -> Result<(), ConfigError> {
    if !config.enabled {
        return Ok(());
    }

    if !config.has_endpoint() {
        tracing::warn!("Proxy is enabled but no http or https endpoint is set; fetching directly");
        return Ok(());
    }

    for endpoint in config.http.iter().chain(config.https.iter()) {
        validate_endpoint(endpoint)?;
    }

    let health_url = Url::parse(&config.health_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid health-url: {}", e)))?;
    if health_url.scheme() != "http" && health_url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "health-url must be http or https, got '{}'",
            config.health_url
        )));
    }

    Ok(())
}

/// Validates a `host:port` proxy endpoint
fn validate_endpoint(endpoint: &str) -> Result<(), ConfigError> {
    let (host, port) = endpoint.rsplit_once(':').ok_or_else(|| {
        ConfigError::Validation(format!(
            "Proxy endpoint '{}' must be in host:port form",
            endpoint
        ))
    })?;

    if host.is_empty() || host.contains('/') {
        return Err(ConfigError::Validation(format!(
            "Proxy endpoint '{}' has an invalid host",
            endpoint
        )));
    }

    port.parse::<u16>().map_err(|_| {
        ConfigError::Validation(format!(
            "Proxy endpoint '{}' has an invalid port",
            endpoint
        ))
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proxy(http: Option<&str>, https: Option<&str>) -> ProxySettings {
        ProxySettings {
            enabled: true,
            http: http.map(str::to_string),
            https: https.map(str::to_string),
            ..ProxySettings::default()
        }
    }

    #[test]
    fn test_validate_endpoint() {
        assert!(validate_endpoint("proxy.local:3128").is_ok());
        assert!(validate_endpoint("10.0.0.1:8080").is_ok());

        assert!(validate_endpoint("").is_err());
        assert!(validate_endpoint("proxy.local").is_err());
        assert!(validate_endpoint(":3128").is_err());
        assert!(validate_endpoint("proxy.local:http").is_err());
        assert!(validate_endpoint("proxy.local:99999").is_err());
        assert!(validate_endpoint("http://proxy.local:3128").is_err());
    }

    #[test]
    fn test_disabled_proxy_skips_endpoint_checks() {
        let mut settings = proxy(Some("not an endpoint"), None);
        settings.enabled = false;
        assert!(validate_proxy_settings(&settings).is_ok());
    }

    #[test]
    fn test_enabled_proxy_without_endpoint_is_accepted() {
        assert!(validate_proxy_settings(&proxy(None, None)).is_ok());
        assert!(validate_proxy_settings(&proxy(Some("p.local:1"), None)).is_ok());
        assert!(validate_proxy_settings(&proxy(None, Some("p.local:1"))).is_ok());
    }

    #[test]
    fn test_health_url_must_be_http() {
        let mut settings = proxy(Some("p.local:1"), None);
        settings.health_url = "ftp://example.com/".to_string();
        assert!(matches!(
            validate_proxy_settings(&settings),
            Err(ConfigError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_validate_queue_config() {
        let mut config = QueueConfig::default();
        assert!(validate_queue_config(&config).is_ok());

        config.poll_interval_ms = 0;
        assert!(validate_queue_config(&config).is_err());

        let mut config = QueueConfig::default();
        config.redis_url = "http://127.0.0.1:6379".to_string();
        assert!(matches!(
            validate_queue_config(&config),
            Err(ConfigError::InvalidUrl(_))
        ));

        let mut config = QueueConfig::default();
        config.inbound = "  ".to_string();
        assert!(validate_queue_config(&config).is_err());

        let mut config = QueueConfig::default();
        config.inbound = LINKS_QUEUE.to_string();
        assert!(validate_queue_config(&config).is_err());
    }

    #[test]
    fn test_validate_user_agent() {
        assert!(validate_user_agent("landing-crawler/0.1").is_ok());
        assert!(validate_user_agent("").is_err());
    }
}
