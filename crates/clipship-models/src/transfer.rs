//! Transfer identity and phase tracking.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for one upload attempt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct TransferId(pub String);

impl TransferId {
    /// Generate a new random transfer ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TransferId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Phase of an upload attempt.
///
/// Forward-only: Idle → Signing → Uploading → HandingOff → Done, with
/// Failed absorbing from any phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum UploadPhase {
    /// No transfer started yet
    #[default]
    Idle,
    /// Waiting for the signing decision
    Signing,
    /// Bytes moving to storage
    Uploading,
    /// Upload finished, starting the processing job
    HandingOff,
    /// Stream location handed to the caller
    Done,
    /// Terminal failure
    Failed,
}

impl UploadPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadPhase::Idle => "idle",
            UploadPhase::Signing => "signing",
            UploadPhase::Uploading => "uploading",
            UploadPhase::HandingOff => "handing_off",
            UploadPhase::Done => "done",
            UploadPhase::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadPhase::Done | UploadPhase::Failed)
    }
}
