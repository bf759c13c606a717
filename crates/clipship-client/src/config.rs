//! Client configuration.

use std::time::Duration;

/// Configuration for the upload client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL serving /sign, /start-job and /ping
    pub base_url: String,
    /// Per-request timeout. `None` leaves the transport without a
    /// client-side deadline so large part uploads are never cut off.
    pub request_timeout: Option<Duration>,
    /// Worker pool size for multipart part uploads
    pub part_concurrency: usize,
    /// Keep-alive ping cadence while an upload is in flight
    pub heartbeat_interval: Duration,
    /// Status code the storage provider answers a successful form POST
    /// with; anything else is a rejection
    pub single_post_success: u16,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:10000".to_string(),
            request_timeout: None,
            part_concurrency: 5,
            heartbeat_interval: Duration::from_millis(15_000),
            single_post_success: 204,
        }
    }
}

impl ClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("CLIPSHIP_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:10000".to_string()),
            request_timeout: std::env::var("CLIPSHIP_REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs),
            part_concurrency: std::env::var("CLIPSHIP_PART_CONCURRENCY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),
            heartbeat_interval: Duration::from_millis(
                std::env::var("CLIPSHIP_HEARTBEAT_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(15_000),
            ),
            single_post_success: std::env::var("CLIPSHIP_SINGLE_POST_SUCCESS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(204),
        }
    }
}
