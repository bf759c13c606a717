//! Single-POST uploader for files below the multipart threshold.

use std::io;
use std::path::Path;

use bytes::Bytes;
use futures::Stream;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client};
use tokio::io::AsyncReadExt;
use tracing::{debug, info};

use clipship_models::SinglePostGrant;

use crate::error::{UploadError, UploadResult};
use crate::progress::ProgressReporter;

/// Read granularity for the streamed form body.
const READ_CHUNK_BYTES: usize = 64 * 1024;

/// Uploads a whole file in one signed multipart/form-data POST.
pub struct SinglePostUploader {
    http: Client,
    reporter: ProgressReporter,
    success_status: u16,
}

impl SinglePostUploader {
    pub fn new(http: Client, reporter: ProgressReporter, success_status: u16) -> Self {
        Self {
            http,
            reporter,
            success_status,
        }
    }

    /// POST the file under the signed policy fields.
    ///
    /// The form carries every signed field verbatim and the file
    /// content last, under the name `file`; storage providers evaluate
    /// the policy fields before reading the payload. Success is the
    /// configured status exactly, any other answer is a rejection.
    pub async fn upload(&self, path: &Path, grant: &SinglePostGrant) -> UploadResult<()> {
        let size = tokio::fs::metadata(path).await?.len();
        let file = tokio::fs::File::open(path).await?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        debug!(url = %grant.url, size, "Uploading via single POST");

        let mut form = Form::new();
        for (name, value) in &grant.fields {
            form = form.text(name.clone(), value.clone());
        }

        let mime = grant
            .fields
            .get("Content-Type")
            .map(String::as_str)
            .unwrap_or("application/octet-stream");

        let body = Body::wrap_stream(progress_stream(file, size, self.reporter.clone()));
        let part = Part::stream_with_length(body, size)
            .file_name(filename)
            .mime_str(mime)
            .map_err(|e| UploadError::upload_rejected(e.to_string()))?;
        form = form.part("file", part);

        let response = self
            .http
            .post(&grant.url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| UploadError::upload_rejected(e.to_string()))?;

        let status = response.status().as_u16();
        if status != self.success_status {
            return Err(UploadError::upload_rejected(format!(
                "storage returned {}, expected {}",
                status, self.success_status
            )));
        }

        self.reporter.force_complete();
        self.reporter.log("Upload complete");
        info!(s3_key = %grant.s3_key, "Single-POST upload complete");
        Ok(())
    }
}

/// Stream the file in chunks, feeding bytes-sent progress as the
/// transport pulls them.
fn progress_stream(
    file: tokio::fs::File,
    total: u64,
    reporter: ProgressReporter,
) -> impl Stream<Item = io::Result<Bytes>> + Send + 'static {
    futures::stream::try_unfold((file, 0u64), move |(mut file, sent)| {
        let reporter = reporter.clone();
        async move {
            let mut buf = vec![0u8; READ_CHUNK_BYTES];
            let read = file.read(&mut buf).await?;
            if read == 0 {
                return io::Result::Ok(None);
            }
            buf.truncate(read);

            let sent = sent + read as u64;
            if total > 0 {
                reporter.update_percent(sent as f64 / total as f64 * 100.0);
            }

            io::Result::Ok(Some((Bytes::from(buf), (file, sent))))
        }
    })
}
