//! Landing crawler main entry point
//!
//! This is the command-line interface for the queue-driven link extractor.

use anyhow::Context;
use clap::Parser;
use landing_crawler::config::{load_config_with_hash, Config};
use landing_crawler::crawler::{run_worker, HealthProbe, ProxyHealthProbe};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Landing crawler: a queue-driven link extractor
///
/// Consumes page jobs from the inbound queue, extracts every link on each
/// page and publishes the results to the downstream queues. Proxy and
/// broker settings can also be given through the environment (USE_PROXY,
/// PROXY_HTTP, PROXY_HTTPS, PROXY_HEALTH_URL, REDIS_URL, INBOUND_QUEUE).
#[derive(Parser, Debug)]
#[command(name = "landing-crawler")]
#[command(version)]
#[command(about = "A queue-driven link extractor", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show the effective settings without consuming jobs
    #[arg(long, conflicts_with = "check_proxy")]
    dry_run: bool,

    /// Probe the configured proxy once and exit (status 1 when unhealthy)
    #[arg(long, conflicts_with = "dry_run")]
    check_proxy: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let (config, config_hash) = load_config_with_hash(cli.config.as_deref())
        .context("Failed to load configuration")?;
    match (&cli.config, &config_hash) {
        (Some(path), Some(hash)) => {
            tracing::info!("Configuration loaded from {} (hash: {})", path.display(), hash)
        }
        _ => tracing::info!("Configuration loaded from defaults and environment"),
    }

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.check_proxy {
        let healthy = handle_check_proxy(&config).await?;
        if !healthy {
            std::process::exit(1);
        }
    } else {
        handle_run(&config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("landing_crawler=info,warn"),
            1 => EnvFilter::new("landing_crawler=debug,info"),
            2 => EnvFilter::new("landing_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== Landing Crawler Dry Run ===\n");

    println!("Queue:");
    println!("  Redis URL: {}", config.queue.redis_url);
    println!("  Inbound queue: {}", config.queue.inbound);
    println!("  Poll interval: {}ms", config.queue.poll_interval_ms);

    println!("\nFetch:");
    println!("  User agent: {}", config.fetch.user_agent);
    println!(
        "  Timeout: {}s",
        landing_crawler::crawler::FETCH_TIMEOUT.as_secs()
    );

    println!("\nProxy:");
    match config.active_proxy() {
        Some(proxy) => {
            println!("  HTTP: {}", proxy.http.as_deref().unwrap_or("(direct)"));
            println!("  HTTPS: {}", proxy.https.as_deref().unwrap_or("(direct)"));
            println!("  Health URL: {}", proxy.health_url);
        }
        None => println!("  Disabled"),
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --check-proxy mode: probes the proxy once
async fn handle_check_proxy(config: &Config) -> anyhow::Result<bool> {
    if config.active_proxy().is_none() {
        println!("Proxy is disabled; nothing to check");
        return Ok(true);
    }

    let probe = ProxyHealthProbe::new(config).context("Failed to build proxy client")?;
    let healthy = probe.is_healthy().await;

    if healthy {
        println!("✓ Proxy is healthy");
    } else {
        println!("✗ Proxy is unhealthy");
    }
    Ok(healthy)
}

/// Handles the main worker operation
async fn handle_run(config: &Config) -> anyhow::Result<()> {
    tracing::info!(
        inbound = %config.queue.inbound,
        proxy = config.active_proxy().is_some(),
        "Starting landing crawler worker"
    );

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    match run_worker(config, shutdown).await {
        Ok(stats) => {
            tracing::info!("Worker stopped after {} jobs", stats.processed);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Worker failed: {}", e);
            Err(e.into())
        }
    }
}
