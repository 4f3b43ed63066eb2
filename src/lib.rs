//! Landing crawler: a queue-driven link extractor
//!
//! This crate implements a worker that takes page jobs off a message queue,
//! fetches each page (optionally through a proxy), extracts and normalizes
//! its hyperlinks, and routes the result, an empty-result signal, or an
//! error report to downstream queues.

pub mod config;
pub mod crawler;
pub mod messages;
pub mod queue;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for landing crawler operations
#[derive(Debug, Error)]
pub enum CrawlerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Page fetch failures, classified by how the request failed
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timeout for {url}: {source}")]
    Timeout { url: String, source: reqwest::Error },

    #[error("Proxy connection failed for {url}: {source}")]
    Proxy { url: String, source: reqwest::Error },

    #[error("HTTP error for {url}: {source}")]
    Network { url: String, source: reqwest::Error },

    #[error("Invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        source: ::url::ParseError,
    },
}

/// Queue channel errors
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Failed to publish to {queue}: {message}")]
    Publish { queue: String, message: String },
}

/// Result type alias for landing crawler operations
pub type Result<T> = std::result::Result<T, CrawlerError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for queue operations
pub type QueueResult<T> = std::result::Result<T, QueueError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{extract_links, JobOutcome, JobProcessor, PageFetcher};
pub use messages::{EmptyResultSignal, ErrorReport, Job, LinkRecord};
pub use queue::{Channel, Delivery, MemoryChannel, MessageRouter};
pub use state::JobState;
pub use self::url::normalize_link;
