//! Dispatcher — the queue contract and its sole consumer.
//!
//! Exactly one dispatcher task runs for the process lifetime. It consumes
//! metric messages strictly one at a time and pushes each to the status-page
//! API; a slow destination therefore delays everything queued behind it.
//! No retries, no batching: every failure class logs, counts, and moves on
//! to the next message.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, error};

use crate::config::Settings;
use crate::stats::{bump, Stats};

/// One metric value in flight from a poller to the status page.
///
/// Carries the destination identifiers verbatim from the application record
/// that produced it. Consumed exactly once, then discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricMessage {
    pub page_id: String,
    pub metric_id: String,
    pub api_key: String,
    pub value: f64,
}

// ── Destination Wire Format ─────────────────────────────────────────

/// A single data point.
///
/// The timestamp is epoch seconds truncated to `i32` — the width the
/// destination API documents. This wraps in 2038; widening it would change
/// the wire format, so it stays as-is.
#[derive(Debug, Serialize, Deserialize)]
pub struct DataPoint {
    pub timestamp: i32,
    pub value: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PushPayload {
    pub data: DataPoint,
}

// ── Consumer Loop ───────────────────────────────────────────────────

/// Consume the queue until every sender is gone.
///
/// Blocks on an empty queue; processes one message at a time.
pub async fn run(
    client: reqwest::Client,
    settings: Arc<Settings>,
    mut rx: UnboundedReceiver<MetricMessage>,
    stats: Arc<Stats>,
) {
    while let Some(message) = rx.recv().await {
        push_metric(&client, &settings, &message, &stats).await;
    }
}

/// Push one data point. Failures log and count; the caller always moves on.
async fn push_metric(
    client: &reqwest::Client,
    settings: &Settings,
    message: &MetricMessage,
    stats: &Stats,
) {
    let url = format!(
        "{}/pages/{}/metrics/{}/data.json",
        settings.status_base_url, message.page_id, message.metric_id
    );
    if settings.debug {
        debug!(metric_id = %message.metric_id, "dispatching to {}", url);
    }

    let payload = PushPayload {
        data: DataPoint {
            timestamp: Utc::now().timestamp() as i32,
            value: message.value,
        },
    };
    let body = match serde_json::to_vec(&payload) {
        Ok(body) => body,
        Err(err) => {
            error!(metric_id = %message.metric_id, "couldn't encode payload: {}", err);
            bump(&stats.push.errors_encode);
            return;
        }
    };

    let resp = match client
        .post(&url)
        .header("Authorization", format!("OAuth {}", message.api_key))
        .header("Content-Type", "application/json")
        .body(body)
        .timeout(settings.push_timeout)
        .send()
        .await
    {
        Ok(resp) => resp,
        Err(err) => {
            error!(metric_id = %message.metric_id, url = %url, "push request failed: {:#}", err);
            bump(&stats.push.errors_http);
            return;
        }
    };
    bump(&stats.push.requests);

    let status = resp.status();
    let body = match resp.text().await {
        Ok(body) => body,
        Err(err) => {
            error!(metric_id = %message.metric_id, "couldn't read push response: {:#}", err);
            bump(&stats.push.errors_read_body);
            return;
        }
    };

    // 201 Created is the only success; anything else is a delivery failure.
    if status.as_u16() != 201 {
        error!(
            metric_id = %message.metric_id,
            status = %status,
            "status page rejected data point: {}",
            body
        );
        bump(&stats.push.errors_status);
    }
}
