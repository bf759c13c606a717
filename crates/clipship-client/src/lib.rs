//! Upload orchestration client for the ClipShip backend.
//!
//! Drives the full upload flow natively:
//! - Signing: ask the backend for a single-POST or multipart grant
//! - Single-POST uploads with a streamed form body
//! - Multipart uploads with a bounded worker pool and ETag receipts
//! - Keep-alive pings covering the upload window
//! - Job handoff returning the processing-log stream location

pub mod api;
pub mod config;
pub mod error;
pub mod heartbeat;
pub mod multipart;
pub mod orchestrator;
pub mod progress;
pub mod single;

pub use api::ApiClient;
pub use config::ClientConfig;
pub use error::{UploadError, UploadResult};
pub use heartbeat::Heartbeat;
pub use multipart::MultipartUploader;
pub use orchestrator::UploadOrchestrator;
pub use progress::{EventSink, ProgressReporter};
pub use single::SinglePostUploader;
