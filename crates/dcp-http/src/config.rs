// crates/dcp-http/src/config.rs
//
// Retry and recording policy for the HTTP client.
// Loaded as the `[http]` table of the tools' TOML configuration, with every
// field defaulted.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Retry budget, per-request timeout, and recording options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Wall-clock budget for one retried call, in seconds.
    #[serde(default = "default_retry_timeout_seconds")]
    pub retry_timeout_seconds: u64,

    /// Maximum attempts for one retried call (including the first).
    #[serde(default = "default_retry_max_attempts")]
    pub retry_max_attempts: u32,

    /// Backoff multiplier: wait = min(multiplier * 2^retry, max_interval).
    #[serde(default = "default_retry_multiplier")]
    pub retry_multiplier: f64,

    /// Upper bound on a single backoff wait, in seconds.
    #[serde(default = "default_retry_max_interval_seconds")]
    pub retry_max_interval_seconds: f64,

    /// Timeout for each individual request, in seconds.
    #[serde(default = "default_individual_request_timeout_seconds")]
    pub individual_request_timeout_seconds: u64,

    /// Write every request/response pair to `record_directory`.
    #[serde(default)]
    pub record: bool,

    #[serde(default = "default_record_directory")]
    pub record_directory: String,
}

fn default_retry_timeout_seconds() -> u64 {
    7200
}

fn default_retry_max_attempts() -> u32 {
    10000
}

fn default_retry_multiplier() -> f64 {
    1.0
}

fn default_retry_max_interval_seconds() -> f64 {
    60.0
}

fn default_individual_request_timeout_seconds() -> u64 {
    60
}

fn default_record_directory() -> String {
    ".".to_string()
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            retry_timeout_seconds: default_retry_timeout_seconds(),
            retry_max_attempts: default_retry_max_attempts(),
            retry_multiplier: default_retry_multiplier(),
            retry_max_interval_seconds: default_retry_max_interval_seconds(),
            individual_request_timeout_seconds: default_individual_request_timeout_seconds(),
            record: false,
            record_directory: default_record_directory(),
        }
    }
}

impl HttpConfig {
    pub fn retry_budget(&self) -> Duration {
        Duration::from_secs(self.retry_timeout_seconds)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.individual_request_timeout_seconds)
    }

    /// Wait before the retry following `retry` earlier failures (0-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        let exp = 2f64.powi(retry.min(64) as i32);
        let secs = (self.retry_multiplier * exp)
            .min(self.retry_max_interval_seconds)
            .max(0.0);
        if secs.is_finite() {
            Duration::from_secs_f64(secs)
        } else {
            Duration::ZERO
        }
    }
}
