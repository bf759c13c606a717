//! Error types for upload operations.

use thiserror::Error;

/// Result type for upload operations.
pub type UploadResult<T> = Result<T, UploadError>;

/// Errors that can occur while driving an upload.
///
/// Every variant is terminal for the attempt; there is no retry layer.
/// The variant names the stage that failed so callers can report it
/// without parsing message text.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Upload rejected: {0}")]
    UploadRejected(String),

    #[error("Part {part_number} upload failed: {reason}")]
    PartUploadFailed { part_number: u32, reason: String },

    #[error("Completion failed: {0}")]
    CompletionFailed(String),

    #[error("Job start failed: {0}")]
    JobStartFailed(String),

    #[error("Invalid client configuration: {0}")]
    Config(String),

    #[error("Upload task failed: {0}")]
    TaskFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl UploadError {
    pub fn signing_failed(msg: impl Into<String>) -> Self {
        Self::SigningFailed(msg.into())
    }

    pub fn upload_rejected(msg: impl Into<String>) -> Self {
        Self::UploadRejected(msg.into())
    }

    pub fn part_failed(part_number: u32, reason: impl Into<String>) -> Self {
        Self::PartUploadFailed {
            part_number,
            reason: reason.into(),
        }
    }

    pub fn completion_failed(msg: impl Into<String>) -> Self {
        Self::CompletionFailed(msg.into())
    }

    pub fn job_start_failed(msg: impl Into<String>) -> Self {
        Self::JobStartFailed(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
