//! Upload event envelope for user-facing progress reporting.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Event emitted to a transfer's progress sink.
///
/// The transcript (`Log`/`Error` lines) is append-only; `Progress`
/// values are emitted non-decreasing by the reporter.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UploadEvent {
    /// Transcript line with timestamp
    Log {
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// Progress update (0-100)
    Progress { value: f64 },

    /// Terminal error line
    Error {
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// Transfer finished; stream location for the caller
    Done { stream: String },
}

impl UploadEvent {
    /// Create a log event.
    pub fn log(message: impl Into<String>) -> Self {
        UploadEvent::Log {
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a progress event, clamped to 0-100.
    pub fn progress(value: f64) -> Self {
        UploadEvent::Progress {
            value: value.clamp(0.0, 100.0),
        }
    }

    /// Create an error event.
    pub fn error(message: impl Into<String>) -> Self {
        UploadEvent::Error {
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a done event.
    pub fn done(stream: impl Into<String>) -> Self {
        UploadEvent::Done {
            stream: stream.into(),
        }
    }
}
