//! HTTP client for the backend endpoints: signing, job handoff and
//! keep-alive pings.

use reqwest::Client;
use tracing::{debug, warn};

use clipship_models::{JobStartRequest, JobStartResult, SigningDecision, UploadRequest};

use crate::config::ClientConfig;
use crate::error::{UploadError, UploadResult};

/// Client for the ClipShip backend.
///
/// Holds one `reqwest::Client`; clones share the connection pool, so
/// the uploaders and the heartbeat ride the same transport.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client from configuration.
    pub fn new(config: &ClientConfig) -> UploadResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| UploadError::config(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Shared HTTP transport, for the uploaders.
    pub fn http(&self) -> &Client {
        &self.http
    }

    /// Backend origin with no trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Ask the backend to sign an upload.
    ///
    /// The response shape is validated while decoding, so a grant that
    /// parses is complete enough to act on.
    pub async fn sign(&self, request: &UploadRequest) -> UploadResult<SigningDecision> {
        let url = format!("{}/sign", self.base_url);
        debug!(filename = %request.filename, size = request.size, "Requesting upload grant");

        let response = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| UploadError::signing_failed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(UploadError::signing_failed(format!(
                "backend returned {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| UploadError::signing_failed(e.to_string()))?;
        let decision: SigningDecision = serde_json::from_str(&body)
            .map_err(|e| UploadError::signing_failed(e.to_string()))?;

        match &decision {
            SigningDecision::SinglePost(grant) => {
                debug!(s3_key = %grant.s3_key, "Granted single-POST upload");
            }
            SigningDecision::Multipart(grant) => {
                debug!(
                    s3_key = %grant.s3_key,
                    parts = grant.total_parts(),
                    part_mb = grant.part_mb,
                    upload_id = grant.upload_id.as_deref().unwrap_or("-"),
                    "Granted multipart upload"
                );
            }
        }

        Ok(decision)
    }

    /// Start the processing job for an uploaded object.
    pub async fn start_job(&self, request: &JobStartRequest) -> UploadResult<JobStartResult> {
        let url = format!("{}/start-job", self.base_url);
        debug!(s3_key = %request.s3_key, parts = request.parts, "Starting processing job");

        let response = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| UploadError::job_start_failed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(UploadError::job_start_failed(format!(
                "backend returned {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| UploadError::job_start_failed(e.to_string()))?;
        let result: JobStartResult = serde_json::from_str(&body)
            .map_err(|e| UploadError::job_start_failed(e.to_string()))?;

        if result.stream.is_empty() {
            return Err(UploadError::job_start_failed(
                "backend returned an empty stream location",
            ));
        }

        Ok(result)
    }

    /// Fire one keep-alive ping. Outcomes are ignored: reaching the
    /// service at all is what keeps it awake, so even a 404 counts.
    pub async fn ping(&self) {
        let url = format!("{}/ping", self.base_url);
        if let Err(e) = self.http.get(&url).send().await {
            warn!("Keep-alive ping failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let config = ClientConfig {
            base_url: "http://localhost:10000/".to_string(),
            ..ClientConfig::default()
        };
        let client = ApiClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "http://localhost:10000");
    }
}
