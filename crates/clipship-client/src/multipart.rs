//! Multipart uploader: a bounded worker pool PUTting file slices to
//! presigned part URLs, then submitting the completion manifest.

use std::collections::VecDeque;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use reqwest::header;
use reqwest::Client;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::task::JoinSet;
use tracing::{debug, info};

use clipship_models::{format_bytes, CompletionManifest, MultipartGrant, PartReceipt};

use crate::error::{UploadError, UploadResult};
use crate::progress::ProgressReporter;

/// Uploads a file as presigned parts with bounded concurrency.
pub struct MultipartUploader {
    http: Client,
    reporter: ProgressReporter,
    concurrency: usize,
}

impl MultipartUploader {
    pub fn new(http: Client, reporter: ProgressReporter, concurrency: usize) -> Self {
        Self {
            http,
            reporter,
            concurrency,
        }
    }

    /// Upload every part, then complete.
    ///
    /// The first part failure cancels the in-flight siblings, leaves
    /// the queued parts unclaimed and becomes the returned error.
    /// There is deliberately no abort call afterwards: the grant
    /// carries no presigned abort URL, so a dangling upload is left
    /// for storage-side lifecycle rules to reap.
    pub async fn upload(
        &self,
        path: &Path,
        grant: &MultipartGrant,
    ) -> UploadResult<Vec<PartReceipt>> {
        let file_size = tokio::fs::metadata(path).await?.len();
        let part_size = grant.part_size_bytes();
        let total_parts = grant.total_parts();

        info!(
            parts = total_parts,
            part_size = %format_bytes(part_size),
            size = %format_bytes(file_size),
            "Starting multipart upload"
        );

        let workers = self.concurrency.min(total_parts).max(1);
        // claiming an index is one locked pop, so every part is taken
        // exactly once no matter how workers interleave
        let queue: Arc<Mutex<VecDeque<usize>>> =
            Arc::new(Mutex::new((0..total_parts).collect()));
        let receipts: Arc<Mutex<Vec<Option<PartReceipt>>>> =
            Arc::new(Mutex::new(vec![None; total_parts]));
        let completed = Arc::new(AtomicUsize::new(0));
        let part_urls = Arc::new(grant.part_urls.clone());

        let mut pool = JoinSet::new();
        for _ in 0..workers {
            let worker = PartWorker {
                http: self.http.clone(),
                path: path.to_path_buf(),
                part_urls: Arc::clone(&part_urls),
                queue: Arc::clone(&queue),
                receipts: Arc::clone(&receipts),
                completed: Arc::clone(&completed),
                reporter: self.reporter.clone(),
                part_size,
                file_size,
                total_parts,
            };
            pool.spawn(worker.run());
        }

        while let Some(joined) = pool.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    // first failure wins; cancel the in-flight siblings
                    pool.abort_all();
                    return Err(e);
                }
                Err(e) if e.is_cancelled() => {}
                Err(e) => return Err(UploadError::TaskFailed(e.to_string())),
            }
        }

        let receipts = collect_receipts(&receipts)?;
        let manifest = CompletionManifest::from_receipts(receipts);
        self.complete(&grant.complete_url, &manifest).await?;

        self.reporter.force_complete();
        self.reporter.log("Upload complete");
        info!(s3_key = %grant.s3_key, parts = manifest.len(), "Multipart upload complete");
        Ok(manifest.parts().to_vec())
    }

    /// Submit the completion manifest.
    async fn complete(&self, url: &str, manifest: &CompletionManifest) -> UploadResult<()> {
        debug!(parts = manifest.len(), "Submitting completion manifest");

        let response = self
            .http
            .post(url)
            .header(header::CONTENT_TYPE, "application/xml")
            .body(manifest.to_xml())
            .send()
            .await
            .map_err(|e| UploadError::completion_failed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(UploadError::completion_failed(format!(
                "storage returned {}",
                response.status()
            )));
        }

        Ok(())
    }
}

/// One pool worker: claims part indices until the queue drains.
struct PartWorker {
    http: Client,
    path: PathBuf,
    part_urls: Arc<Vec<String>>,
    queue: Arc<Mutex<VecDeque<usize>>>,
    receipts: Arc<Mutex<Vec<Option<PartReceipt>>>>,
    completed: Arc<AtomicUsize>,
    reporter: ProgressReporter,
    part_size: u64,
    file_size: u64,
    total_parts: usize,
}

impl PartWorker {
    async fn run(self) -> UploadResult<()> {
        loop {
            let index = self.queue.lock().unwrap().pop_front();
            let Some(index) = index else {
                return Ok(());
            };

            let receipt = self.upload_part(index).await?;

            self.receipts.lock().unwrap()[index] = Some(receipt);
            let done = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
            self.reporter
                .update_percent(done as f64 / self.total_parts as f64 * 100.0);
        }
    }

    /// PUT one slice and turn the response into a receipt. The part
    /// number in errors and receipts is 1-based.
    async fn upload_part(&self, index: usize) -> UploadResult<PartReceipt> {
        let part_number = (index + 1) as u32;
        let (start, end) = part_range(index, self.part_size, self.file_size);

        let chunk = read_slice(&self.path, start, end)
            .await
            .map_err(|e| UploadError::part_failed(part_number, e.to_string()))?;

        debug!(part = part_number, bytes = chunk.len(), "Uploading part");

        let response = self
            .http
            .put(&self.part_urls[index])
            .body(chunk)
            .send()
            .await
            .map_err(|e| UploadError::part_failed(part_number, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::part_failed(
                part_number,
                format!("storage returned {}", status),
            ));
        }

        let etag = response
            .headers()
            .get(header::ETAG)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
            .ok_or_else(|| {
                UploadError::part_failed(part_number, "response carries no ETag header")
            })?;

        Ok(PartReceipt::new(part_number, etag))
    }
}

/// Byte range `[start, end)` for a part index, clamped to the file.
fn part_range(index: usize, part_size: u64, file_size: u64) -> (u64, u64) {
    let start = (index as u64).saturating_mul(part_size).min(file_size);
    let end = start.saturating_add(part_size).min(file_size);
    (start, end)
}

/// Read one slice. Opens its own handle, so workers seek independently.
async fn read_slice(path: &Path, start: u64, end: u64) -> std::io::Result<Vec<u8>> {
    let len = (end - start) as usize;
    if len == 0 {
        return Ok(Vec::new());
    }

    let mut file = tokio::fs::File::open(path).await?;
    file.seek(SeekFrom::Start(start)).await?;

    let mut buf = vec![0u8; len];
    file.read_exact(&mut buf).await?;
    Ok(buf)
}

/// Pull the receipts out of their slots. Every slot must be filled
/// once the pool drains cleanly.
fn collect_receipts(slots: &Mutex<Vec<Option<PartReceipt>>>) -> UploadResult<Vec<PartReceipt>> {
    slots
        .lock()
        .unwrap()
        .iter()
        .enumerate()
        .map(|(index, slot)| {
            slot.clone().ok_or_else(|| {
                UploadError::TaskFailed(format!("no receipt recorded for part {}", index + 1))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_part_range_slices_cover_the_file() {
        let part_size = 8 * 1024 * 1024;
        let file_size = 20 * 1024 * 1024;

        assert_eq!(part_range(0, part_size, file_size), (0, 8 * 1024 * 1024));
        assert_eq!(
            part_range(1, part_size, file_size),
            (8 * 1024 * 1024, 16 * 1024 * 1024)
        );
        assert_eq!(
            part_range(2, part_size, file_size),
            (16 * 1024 * 1024, 20 * 1024 * 1024)
        );
    }

    #[test]
    fn test_part_range_past_the_end_is_empty() {
        let (start, end) = part_range(5, 1024, 2048);
        assert_eq!(start, end);
    }

    #[tokio::test]
    async fn test_read_slice_returns_exact_ranges() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[7u8; 10]).unwrap();
        file.write_all(&[9u8; 6]).unwrap();

        let slice = read_slice(file.path(), 8, 14).await.unwrap();
        assert_eq!(slice, vec![7, 7, 9, 9, 9, 9]);

        let empty = read_slice(file.path(), 16, 16).await.unwrap();
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn test_queue_indices_are_claimed_exactly_once() {
        let queue: Arc<Mutex<VecDeque<usize>>> = Arc::new(Mutex::new((0..100).collect()));
        let claimed = Arc::new(Mutex::new(Vec::new()));

        let mut pool = JoinSet::new();
        for _ in 0..5 {
            let queue = Arc::clone(&queue);
            let claimed = Arc::clone(&claimed);
            pool.spawn(async move {
                loop {
                    let index = queue.lock().unwrap().pop_front();
                    let Some(index) = index else { break };
                    claimed.lock().unwrap().push(index);
                    tokio::task::yield_now().await;
                }
            });
        }
        while pool.join_next().await.is_some() {}

        let mut claimed = claimed.lock().unwrap().clone();
        claimed.sort_unstable();
        assert_eq!(claimed, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_collect_receipts_rejects_missing_slot() {
        let slots = Mutex::new(vec![
            Some(PartReceipt::new(1, "\"a\"")),
            None,
            Some(PartReceipt::new(3, "\"c\"")),
        ]);

        let err = collect_receipts(&slots).unwrap_err();
        assert!(err.to_string().contains("part 2"));
    }
}
