//! Configuration module for the landing crawler
//!
//! Configuration comes from an optional TOML file, overlaid with the
//! process environment (`USE_PROXY`, `PROXY_HTTP`, `PROXY_HTTPS`, ...), and
//! is validated once at startup. The resulting [`Config`] is read-only and
//! passed by reference to the components that need it.
//!
//! # Example
//!
//! ```no_run
//! use landing_crawler::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Some(Path::new("crawler.toml"))).unwrap();
//! println!("Consuming from: {}", config.queue.inbound);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, FetchConfig, ProxySettings, QueueConfig};

// Re-export parser functions
pub use parser::{
    apply_env_overrides, compute_config_hash, load_config, load_config_with_hash,
};
pub use validation::validate;
