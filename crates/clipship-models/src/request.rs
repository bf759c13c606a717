//! Upload signing request.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Metadata the backend needs to pick an upload strategy.
///
/// Serializes to the exact shape the signing endpoint reads:
/// `{"filename": ..., "size": ...}`. The strategy decision (single POST
/// vs multipart) belongs to the backend; the client only reports what
/// it has.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct UploadRequest {
    /// Original file name; the backend derives the object key from it.
    pub filename: String,

    /// File size in bytes. Zero is valid.
    pub size: u64,
}

impl UploadRequest {
    pub fn new(filename: impl Into<String>, size: u64) -> Self {
        Self {
            filename: filename.into(),
            size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_shape() {
        let request = UploadRequest::new("video.mp4", 52_428_800);
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"filename\":\"video.mp4\""));
        assert!(json.contains("\"size\":52428800"));
    }

    #[test]
    fn test_zero_size_is_valid() {
        let request = UploadRequest::new("empty.mp4", 0);
        let parsed: UploadRequest =
            serde_json::from_str(&serde_json::to_string(&request).unwrap()).unwrap();
        assert_eq!(parsed, request);
    }
}
