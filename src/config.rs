//! Process settings and the tracked-application list.
//!
//! Settings are built once from flags/env in `main` and never change. The
//! application list is a JSON file read once at startup; a missing or
//! malformed file is the one fatal error class — the relay has nothing
//! useful to do without a valid list.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Poll-side request timeout. Fixed and short, independent of the
/// configurable push timeout.
pub const POLL_TIMEOUT: Duration = Duration::from_secs(5);

/// Process-wide settings, read-only after startup.
#[derive(Debug, Clone)]
pub struct Settings {
    /// How often the scheduler triggers a full poll round.
    pub interval: Duration,
    /// Timeout for each status-page push request.
    pub push_timeout: Duration,
    /// Log raw bodies and outbound URLs at debug level.
    pub debug: bool,
    /// Monitoring API base URL, trailing separator included.
    pub source_base_url: String,
    /// Status-page API base URL, no trailing separator.
    pub status_base_url: String,
}

/// One configured source/destination pairing plus its metric mapping.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackedApp {
    pub source_api_key: String,
    pub source_app_id: u64,
    pub page_api_key: String,
    pub page_id: String,
    /// Metric-kind name → destination metric id. A kind absent here is
    /// simply not forwarded; unknown names are tolerated and ignored.
    #[serde(default)]
    pub metrics: HashMap<String, String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("couldn't read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("couldn't decode application list: {source}")]
    Decode {
        source: serde_json::Error,
        /// Raw file contents, kept so the caller can log what it saw.
        contents: String,
    },
}

/// Load the tracked-application list from a JSON file.
pub fn load_apps(path: &Path) -> Result<Vec<TrackedApp>, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| ConfigError::Decode { source, contents })
}
