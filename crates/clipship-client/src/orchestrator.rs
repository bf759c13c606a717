//! Upload orchestrator: the end-to-end state machine for one transfer.

use std::path::Path;

use tracing::debug;

use clipship_models::{
    format_bytes, JobStartRequest, JobStartResult, SigningDecision, TransferId, UploadPhase,
    UploadRequest,
};

use crate::api::ApiClient;
use crate::config::ClientConfig;
use crate::error::{UploadError, UploadResult};
use crate::heartbeat::Heartbeat;
use crate::multipart::MultipartUploader;
use crate::progress::{EventSink, ProgressReporter};
use crate::single::SinglePostUploader;

/// Drives one transfer end to end: sign, upload (single POST or
/// multipart, whichever was granted), then start the processing job.
///
/// Each instance runs one transfer at a time and owns its own
/// heartbeat handle, so concurrent transfers in one process cannot
/// interfere with each other's keep-alive.
pub struct UploadOrchestrator {
    config: ClientConfig,
    api: ApiClient,
    reporter: ProgressReporter,
    transfer_id: TransferId,
    phase: UploadPhase,
}

impl UploadOrchestrator {
    /// Create an orchestrator feeding events to the given sink.
    pub fn new(config: ClientConfig, sink: EventSink) -> UploadResult<Self> {
        let api = ApiClient::new(&config)?;
        Ok(Self {
            config,
            api,
            reporter: ProgressReporter::new(sink),
            transfer_id: TransferId::new(),
            phase: UploadPhase::Idle,
        })
    }

    /// Current phase.
    pub fn phase(&self) -> UploadPhase {
        self.phase
    }

    /// Identifier used in log context for this transfer.
    pub fn transfer_id(&self) -> &TransferId {
        &self.transfer_id
    }

    /// Run one transfer. On success the caller receives the stream
    /// location to navigate to; on failure the stage-specific error
    /// comes back unchanged and the phase parks at `Failed`. There are
    /// no retries at this layer.
    pub async fn run(&mut self, path: &Path, parts_hint: u32) -> UploadResult<JobStartResult> {
        match self.execute(path, parts_hint).await {
            Ok(result) => {
                self.set_phase(UploadPhase::Done);
                self.reporter.done(result.stream.clone());
                Ok(result)
            }
            Err(e) => {
                self.set_phase(UploadPhase::Failed);
                self.reporter.error(e.to_string());
                Err(e)
            }
        }
    }

    async fn execute(&mut self, path: &Path, parts_hint: u32) -> UploadResult<JobStartResult> {
        self.reporter.reset();
        self.set_phase(UploadPhase::Signing);

        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| UploadError::config(format!("{} has no file name", path.display())))?;
        let size = tokio::fs::metadata(path).await?.len();

        self.reporter.log(format!(
            "Requesting upload grant for {} ({})",
            filename,
            format_bytes(size)
        ));
        let request = UploadRequest::new(filename, size);
        let decision = self.api.sign(&request).await?;
        let s3_key = decision.s3_key().to_string();

        // the keep-alive covers the whole upload window, success or not
        let mut heartbeat = Heartbeat::start(self.api.clone(), self.config.heartbeat_interval);
        self.set_phase(UploadPhase::Uploading);

        let outcome = self.transfer(path, &decision).await;

        heartbeat.stop();
        outcome?;

        self.set_phase(UploadPhase::HandingOff);
        self.reporter.log("Starting processing job");

        let job = self
            .api
            .start_job(&JobStartRequest::new(s3_key, parts_hint))
            .await?;

        self.reporter.log("Processing job started");
        Ok(job)
    }

    async fn transfer(&self, path: &Path, decision: &SigningDecision) -> UploadResult<()> {
        match decision {
            SigningDecision::SinglePost(grant) => {
                self.reporter.log("Uploading in a single request");
                let uploader = SinglePostUploader::new(
                    self.api.http().clone(),
                    self.reporter.clone(),
                    self.config.single_post_success,
                );
                uploader.upload(path, grant).await
            }
            SigningDecision::Multipart(grant) => {
                self.reporter.log(format!(
                    "Uploading {} parts of up to {}",
                    grant.total_parts(),
                    format_bytes(grant.part_size_bytes())
                ));
                let uploader = MultipartUploader::new(
                    self.api.http().clone(),
                    self.reporter.clone(),
                    self.config.part_concurrency,
                );
                uploader.upload(path, grant).await.map(|_| ())
            }
        }
    }

    fn set_phase(&mut self, next: UploadPhase) {
        debug!(
            transfer_id = %self.transfer_id,
            from = self.phase.as_str(),
            to = next.as_str(),
            "Phase transition"
        );
        self.phase = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_orchestrator_is_idle() {
        let orchestrator =
            UploadOrchestrator::new(ClientConfig::default(), Box::new(|_| {})).unwrap();
        assert_eq!(orchestrator.phase(), UploadPhase::Idle);
        assert!(!orchestrator.phase().is_terminal());
        assert!(!orchestrator.transfer_id().as_str().is_empty());
    }
}
