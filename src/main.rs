//! metric-relay — polls application summaries from a monitoring API and
//! republishes selected values to a status-page API.
//!
//! Pipeline: N concurrent pollers (one task per application per tick) fan in
//! to a single unbounded channel; one dispatcher consumes it and pushes one
//! data point at a time. The channel is deliberately unbounded — producers
//! never block, there is no backpressure, and a slow destination only delays
//! delivery. No retries anywhere: a failed unit of work is logged, counted,
//! and dropped.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

mod config;
mod dispatch;
mod scheduler;
mod server;
mod source;
mod stats;
#[cfg(test)]
mod testutil;

use config::Settings;
use stats::Stats;

#[derive(Debug, Parser)]
#[command(name = "metric-relay", version)]
#[command(about = "Relays application performance metrics to a status page")]
struct Cli {
    /// Path to the tracked-application list
    #[arg(long, env = "CONFIG_PATH", default_value = "relay.json")]
    config: PathBuf,

    /// Log raw bodies and outbound URLs at debug level
    #[arg(long, env = "DEBUG")]
    debug: bool,

    /// Status-page API base URL
    #[arg(long, default_value = "https://api.statuspage.io/v1")]
    status_base_url: String,

    /// Monitoring API base URL (trailing separator included)
    #[arg(long, default_value = "https://api.newrelic.com/v2/applications/")]
    source_base_url: String,

    /// Poll frequency in seconds
    #[arg(long, env = "INTERVAL", default_value_t = 60)]
    interval: u64,

    /// Push request timeout in seconds
    #[arg(long, default_value_t = 5)]
    push_timeout: u64,

    /// Port for the runtime statistics endpoint
    #[arg(long, env = "PORT", default_value_t = 8181)]
    port: u16,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.debug {
        "metric_relay=debug"
    } else {
        "metric_relay=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_target(false)
        .init();

    let settings = Arc::new(Settings {
        interval: Duration::from_secs(cli.interval),
        push_timeout: Duration::from_secs(cli.push_timeout),
        debug: cli.debug,
        source_base_url: cli.source_base_url,
        status_base_url: cli.status_base_url,
    });
    if settings.debug {
        debug!("settings: {:?}", settings);
    }

    // A bad application list is the one fatal condition: nothing to relay.
    let apps = match config::load_apps(&cli.config) {
        Ok(apps) => apps,
        Err(err) => {
            error!("{}", err);
            if let config::ConfigError::Decode { contents, .. } = &err {
                error!("file contents: {}", contents);
            }
            std::process::exit(1);
        }
    };
    info!("tracking metrics for {} applications", apps.len());

    let stats = Arc::new(Stats::new());
    let client = reqwest::Client::new();

    let stats_port = cli.port;
    let server_stats = Arc::clone(&stats);
    tokio::spawn(async move {
        if let Err(err) = server::run(stats_port, server_stats).await {
            error!("statistics endpoint failed: {:#}", err);
        }
    });

    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(dispatch::run(
        client.clone(),
        Arc::clone(&settings),
        rx,
        Arc::clone(&stats),
    ));

    scheduler::run(client, settings, apps, tx, stats).await;
}
