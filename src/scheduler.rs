//! Interval scheduler — fires one poll task per application, no join barrier.
//!
//! Runs one round immediately at startup, then re-triggers the full set on a
//! fixed interval forever. Each trigger is fire-and-forget: rounds may
//! overlap when polling runs longer than the interval. That is the chosen
//! behavior, not a fault — overlapping rounds for the same application
//! construct disjoint messages. A panicking poll task is contained by its
//! task boundary and never reaches the scheduler.

use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time;
use tracing::info;

use crate::config::{Settings, TrackedApp};
use crate::dispatch::MetricMessage;
use crate::source;
use crate::stats::Stats;

/// Trigger one poll round: one spawned task per tracked application.
pub fn poll_round(
    client: &reqwest::Client,
    settings: &Arc<Settings>,
    apps: &[TrackedApp],
    tx: &UnboundedSender<MetricMessage>,
    stats: &Arc<Stats>,
) {
    info!("fetching metrics for {} applications", apps.len());
    for app in apps {
        let client = client.clone();
        let settings = Arc::clone(settings);
        let app = app.clone();
        let tx = tx.clone();
        let stats = Arc::clone(stats);
        tokio::spawn(async move {
            source::poll_application(&client, &settings, &app, &tx, &stats).await;
        });
    }
}

/// Run the scheduler forever.
pub async fn run(
    client: reqwest::Client,
    settings: Arc<Settings>,
    apps: Vec<TrackedApp>,
    tx: UnboundedSender<MetricMessage>,
    stats: Arc<Stats>,
) {
    poll_round(&client, &settings, &apps, &tx, &stats);

    let mut interval = time::interval(settings.interval);
    interval.tick().await; // Skip the immediate tick (we already ran)

    loop {
        interval.tick().await;
        poll_round(&client, &settings, &apps, &tx, &stats);
    }
}
