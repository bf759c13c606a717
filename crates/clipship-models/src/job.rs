//! Job handoff wire types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Request body for starting the processing job after an upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct JobStartRequest {
    /// Object key of the uploaded source video.
    pub s3_key: String,

    /// Requested number of clip parts. Sent exactly as hinted; the
    /// backend applies its own minimum.
    pub parts: u32,
}

impl JobStartRequest {
    pub fn new(s3_key: impl Into<String>, parts: u32) -> Self {
        Self {
            s3_key: s3_key.into(),
            parts,
        }
    }
}

/// Response from the job-start endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct JobStartResult {
    /// Location of the processing log stream. The backend returns a
    /// path relative to its own origin; callers resolve it against the
    /// base URL before navigating.
    pub stream: String,
}
