//! Poller — one round of fetch-and-extract for one tracked application.
//!
//! Each invocation issues a single authenticated GET against the monitoring
//! API, decodes the application summary, and enqueues one message per
//! configured metric kind. Every failure is local to this one round for this
//! one application: log, count, produce nothing, return. Nothing here is
//! retried and nothing propagates to the scheduler.

use serde::Deserialize;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error};

use crate::config::{Settings, TrackedApp, POLL_TIMEOUT};
use crate::dispatch::MetricMessage;
use crate::stats::{bump, Stats};

/// The fixed set of summary fields eligible for forwarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    ResponseTime,
    Throughput,
    ErrorRate,
}

/// Enqueue order within one round.
pub const KIND_ORDER: [MetricKind; 3] = [
    MetricKind::ResponseTime,
    MetricKind::Throughput,
    MetricKind::ErrorRate,
];

impl MetricKind {
    /// The key this kind uses in an application's metric mapping.
    pub fn name(self) -> &'static str {
        match self {
            MetricKind::ResponseTime => "response_time",
            MetricKind::Throughput => "throughput",
            MetricKind::ErrorRate => "error_rate",
        }
    }

    fn extract(self, summary: &SourceSummary) -> f64 {
        match self {
            MetricKind::ResponseTime => summary.response_time,
            MetricKind::Throughput => summary.throughput,
            MetricKind::ErrorRate => summary.error_rate,
        }
    }
}

// ── Source Wire Format ──────────────────────────────────────────────

/// Top-level wrapper around one application's summary.
#[derive(Debug, Deserialize)]
pub struct SourceEnvelope {
    pub application: SourceApplication,
}

#[derive(Debug, Deserialize)]
pub struct SourceApplication {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub reporting: bool,
    #[serde(default)]
    pub application_summary: SourceSummary,
}

/// Decoded snapshot of one poll. Created fresh per round, dropped after
/// extraction.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceSummary {
    #[serde(default)]
    pub response_time: f64,
    #[serde(default)]
    pub throughput: f64,
    #[serde(default)]
    pub error_rate: f64,
    #[serde(default)]
    pub apdex_target: f64,
    #[serde(default)]
    pub apdex_score: f64,
    #[serde(default)]
    pub host_count: f64,
    #[serde(default)]
    pub instance_count: f64,
}

// ── Poller ──────────────────────────────────────────────────────────

/// Run one poll round for one application.
///
/// Infallible from the caller's view — every failure class is handled here
/// by logging, counting, and producing zero messages.
pub async fn poll_application(
    client: &reqwest::Client,
    settings: &Settings,
    app: &TrackedApp,
    tx: &UnboundedSender<MetricMessage>,
    stats: &Stats,
) {
    let url = format!("{}{}.json", settings.source_base_url, app.source_app_id);

    let resp = match client
        .get(&url)
        .header("X-Api-Key", &app.source_api_key)
        .timeout(POLL_TIMEOUT)
        .send()
        .await
    {
        Ok(resp) => resp,
        Err(err) => {
            error!(app_id = app.source_app_id, url = %url, "poll request failed: {:#}", err);
            bump(&stats.poll.errors_http);
            return;
        }
    };
    bump(&stats.poll.requests);

    let body = match resp.text().await {
        Ok(body) => body,
        Err(err) => {
            error!(app_id = app.source_app_id, "couldn't read poll body: {:#}", err);
            bump(&stats.poll.errors_read_body);
            return;
        }
    };

    if settings.debug {
        debug!(app_id = app.source_app_id, "raw poll body: {}", body);
    }

    let sample: SourceEnvelope = match serde_json::from_str(&body) {
        Ok(sample) => sample,
        Err(err) => {
            error!(app_id = app.source_app_id, "couldn't decode poll body: {}", err);
            error!(app_id = app.source_app_id, "raw body: {}", body);
            bump(&stats.poll.errors_decode);
            return;
        }
    };
    if settings.debug {
        debug!(
            app_id = sample.application.id,
            reporting = sample.application.reporting,
            "decoded summary for {}: {:?}",
            sample.application.name,
            sample.application.application_summary
        );
    }

    let summary = &sample.application.application_summary;
    for kind in KIND_ORDER {
        let Some(metric_id) = app.metrics.get(kind.name()) else {
            continue;
        };

        match kind {
            MetricKind::ResponseTime => bump(&stats.poll.kinds_response_time),
            MetricKind::Throughput => bump(&stats.poll.kinds_throughput),
            MetricKind::ErrorRate => bump(&stats.poll.kinds_error_rate),
        }

        let message = MetricMessage {
            page_id: app.page_id.clone(),
            metric_id: metric_id.clone(),
            api_key: app.page_api_key.clone(),
            value: kind.extract(summary),
        };
        // The receiver only disappears when the process is tearing down.
        if tx.send(message).is_err() {
            error!(app_id = app.source_app_id, "dispatcher is gone, dropping metric");
            return;
        }
    }
}
