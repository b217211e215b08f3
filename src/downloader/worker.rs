//! Single-resource download worker.
//!
//! One worker call performs the whole five-outcome state machine for a
//! descriptor: stream the payload to an unverified temp file while hashing
//! it, fetch the companion checksum, compare, then finalize or discard.
//! The worker never retries; classification is returned as an [`Outcome`]
//! and the caller decides what to do with it.

use crate::downloader::progress::Outcome;
use crate::plan::ResourceDescriptor;
use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Length of a hex-encoded SHA-256 digest.
const CHECKSUM_HEX_LEN: usize = 64;

/// Fetches one archive at a time into the output directory.
#[derive(Debug, Clone)]
pub struct DownloadWorker {
    client: Client,
    output_dir: PathBuf,
}

/// Internal failure classes mapped onto [`Outcome`] at the boundary.
enum FetchFailure {
    Transport(String),
    Io(String),
}

impl DownloadWorker {
    /// Create a worker writing into `output_dir`.
    pub fn new(client: Client, output_dir: PathBuf) -> Self {
        Self { client, output_dir }
    }

    /// Fetch one resource. Exactly one outcome per call; on anything but
    /// [`Outcome::Success`] no file remains at the final path.
    pub async fn fetch(&self, descriptor: &ResourceDescriptor) -> Outcome {
        match self.try_fetch(descriptor).await {
            Ok(outcome) => outcome,
            Err(FetchFailure::Transport(detail)) => Outcome::TransportError(detail),
            Err(FetchFailure::Io(detail)) => Outcome::IoError(detail),
        }
    }

    async fn try_fetch(&self, descriptor: &ResourceDescriptor) -> Result<Outcome, FetchFailure> {
        debug!("Downloading {}", descriptor.url);

        let response = self
            .client
            .get(&descriptor.url)
            .send()
            .await
            .map_err(|e| FetchFailure::Transport(e.to_string()))?;

        // The host answers missing archives with an XML error document.
        if is_xml_payload(&response) {
            debug!("{}: XML error payload, no data", descriptor.file_name);
            return Ok(Outcome::NotFound);
        }

        let temp_path = self.output_dir.join(descriptor.temp_file_name());
        let digest = match self.stream_to_temp(response, &temp_path).await {
            Ok(digest) => digest,
            Err(failure) => {
                discard_temp(&temp_path).await;
                return Err(failure);
            }
        };

        let expected = match self.fetch_checksum(&descriptor.checksum_url).await {
            Ok(expected) => expected,
            Err(failure) => {
                discard_temp(&temp_path).await;
                return Err(failure);
            }
        };

        let Some(expected) = expected else {
            // Absent or placeholder checksum means no data for this slice.
            debug!("{}: checksum body is not a digest", descriptor.file_name);
            discard_temp(&temp_path).await;
            return Ok(Outcome::NotFound);
        };

        if digest != expected {
            warn!(
                "{}: checksum mismatch (expected {}, got {})",
                descriptor.file_name, expected, digest
            );
            discard_temp(&temp_path).await;
            return Ok(Outcome::ChecksumMismatch);
        }

        let final_path = self.output_dir.join(&descriptor.file_name);
        if let Err(e) = tokio::fs::rename(&temp_path, &final_path).await {
            discard_temp(&temp_path).await;
            return Err(FetchFailure::Io(e.to_string()));
        }

        debug!("{}: verified and saved", descriptor.file_name);
        Ok(Outcome::Success)
    }

    /// Stream the response body to `temp_path`, hashing each chunk as it
    /// lands. The payload is never held in memory as a whole.
    async fn stream_to_temp(
        &self,
        response: Response,
        temp_path: &Path,
    ) -> Result<String, FetchFailure> {
        let mut file = tokio::fs::File::create(temp_path)
            .await
            .map_err(|e| FetchFailure::Io(e.to_string()))?;

        let mut hasher = Sha256::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| FetchFailure::Transport(e.to_string()))?;
            hasher.update(&chunk);
            file.write_all(&chunk)
                .await
                .map_err(|e| FetchFailure::Io(e.to_string()))?;
        }

        file.flush()
            .await
            .map_err(|e| FetchFailure::Io(e.to_string()))?;

        Ok(format!("{:x}", hasher.finalize()))
    }

    /// Fetch the companion checksum. Returns `Ok(None)` when the first 64
    /// characters of the body are not a lowercase hex digest, which the
    /// host uses to signal absence of data.
    async fn fetch_checksum(&self, checksum_url: &str) -> Result<Option<String>, FetchFailure> {
        let response = self
            .client
            .get(checksum_url)
            .send()
            .await
            .map_err(|e| FetchFailure::Transport(e.to_string()))?;

        let body = response
            .text()
            .await
            .map_err(|e| FetchFailure::Transport(e.to_string()))?;

        let Some(digest) = body.get(..CHECKSUM_HEX_LEN) else {
            return Ok(None);
        };
        if !digest
            .bytes()
            .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
        {
            return Ok(None);
        }
        Ok(Some(digest.to_string()))
    }
}

fn is_xml_payload(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|content_type| content_type.contains("xml"))
        .unwrap_or(false)
}

/// Best-effort removal of a temp file after a failed fetch.
async fn discard_temp(temp_path: &Path) {
    if let Err(e) = tokio::fs::remove_file(temp_path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("failed to remove temp file {:?}: {}", temp_path, e);
        }
    }
}
