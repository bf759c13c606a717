//! Shared data models for the ClipShip uploader.
//!
//! This crate provides Serde-serializable types for:
//! - Upload signing requests and grants
//! - Multipart part receipts and the completion manifest
//! - Job handoff requests and results
//! - Transfer phases and progress events

pub mod event;
pub mod job;
pub mod receipt;
pub mod request;
pub mod signing;
pub mod transfer;
pub mod utils;

// Re-export common types
pub use event::UploadEvent;
pub use job::{JobStartRequest, JobStartResult};
pub use receipt::{CompletionManifest, PartReceipt};
pub use request::UploadRequest;
pub use signing::{GrantError, GrantResult, MultipartGrant, SigningDecision, SinglePostGrant};
pub use transfer::{TransferId, UploadPhase};
pub use utils::format_bytes;
