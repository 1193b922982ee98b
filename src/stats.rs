//! Free-running counters for both sides of the pipeline.
//!
//! Injected as an `Arc<Stats>` into the pollers and the dispatcher rather
//! than living as process globals, so tests can assert on a locally
//! constructed sink. The statistics endpoint serializes a snapshot on demand.
//! Counters only ever grow; a restart is the only reset.

use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};

/// Poll-side counters, one per error class plus per-kind extraction counts.
#[derive(Debug, Default)]
pub struct PollCounters {
    pub requests: AtomicU64,
    pub errors_http: AtomicU64,
    pub errors_read_body: AtomicU64,
    pub errors_decode: AtomicU64,
    pub kinds_response_time: AtomicU64,
    pub kinds_throughput: AtomicU64,
    pub kinds_error_rate: AtomicU64,
}

/// Push-side counters.
#[derive(Debug, Default)]
pub struct PushCounters {
    pub requests: AtomicU64,
    pub errors_encode: AtomicU64,
    pub errors_http: AtomicU64,
    pub errors_read_body: AtomicU64,
    pub errors_status: AtomicU64,
}

/// The full counter sink shared across the process.
#[derive(Debug, Default)]
pub struct Stats {
    pub poll: PollCounters,
    pub push: PushCounters,
}

pub fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

pub fn get(counter: &AtomicU64) -> u64 {
    counter.load(Ordering::Relaxed)
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point-in-time JSON view of every counter, keyed by pipeline side.
    pub fn snapshot(&self) -> serde_json::Value {
        json!({
            "poll": {
                "requests": get(&self.poll.requests),
                "errors.http": get(&self.poll.errors_http),
                "errors.read_body": get(&self.poll.errors_read_body),
                "errors.decode": get(&self.poll.errors_decode),
                "kinds.response_time": get(&self.poll.kinds_response_time),
                "kinds.throughput": get(&self.poll.kinds_throughput),
                "kinds.error_rate": get(&self.poll.kinds_error_rate),
            },
            "push": {
                "requests": get(&self.push.requests),
                "errors.encode": get(&self.push.errors_encode),
                "errors.http": get(&self.push.errors_http),
                "errors.read_body": get(&self.push.errors_read_body),
                "errors.status": get(&self.push.errors_status),
            },
        })
    }
}
