//! Streaming video downloader with scoped temp-file staging.

use futures::StreamExt;
use reelcache_core::AppError;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// A downloaded video staged in a uniquely named temporary file.
///
/// The file is removed when this guard is dropped, on every exit path.
/// Ownership transfers to whoever holds the guard; keep it alive until the
/// cache write that consumes the file has finished.
pub struct StagedVideo {
    file: NamedTempFile,
}

impl StagedVideo {
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Downloads a remote video resource into a staged temp file.
#[derive(Clone)]
pub struct VideoDownloader {
    client: reqwest::Client,
    staging_dir: Option<PathBuf>,
}

impl VideoDownloader {
    /// Create a downloader with an overall fetch timeout.
    ///
    /// `staging_dir` overrides the system temp directory for staged files.
    pub fn new(timeout: Duration, staging_dir: Option<PathBuf>) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(VideoDownloader {
            client,
            staging_dir,
        })
    }

    /// Stream the resource at `video_url` into a staged temp file.
    ///
    /// The body is written chunk-by-chunk, never buffered whole in memory.
    /// On any failure the partially written file is removed with the
    /// dropped guard.
    pub async fn download(&self, video_url: &str) -> Result<StagedVideo, AppError> {
        let start = std::time::Instant::now();

        let response = self
            .client
            .get(video_url)
            .send()
            .await
            .map_err(|e| AppError::Download(format!("Request to {} failed: {}", video_url, e)))?;

        if !response.status().is_success() {
            return Err(AppError::Download(format!(
                "{} returned status code: {}",
                video_url,
                response.status()
            )));
        }

        let mut builder = tempfile::Builder::new();
        builder.prefix("reelcache-").suffix(".mp4");
        let temp = match self.staging_dir {
            Some(ref dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(|e| AppError::Download(format!("Failed to create staging file: {}", e)))?;

        let mut file = fs::File::create(temp.path())
            .await
            .map_err(|e| AppError::Download(format!("Failed to open staging file: {}", e)))?;

        let mut stream = response.bytes_stream();
        let mut size_bytes: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk =
                chunk.map_err(|e| AppError::Download(format!("Stream read failed: {}", e)))?;
            size_bytes += chunk.len() as u64;
            file.write_all(&chunk)
                .await
                .map_err(|e| AppError::Download(format!("Staging write failed: {}", e)))?;
        }

        file.sync_all()
            .await
            .map_err(|e| AppError::Download(format!("Staging sync failed: {}", e)))?;

        tracing::info!(
            url = %video_url,
            path = %temp.path().display(),
            size_bytes,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Video staged"
        );

        Ok(StagedVideo { file: temp })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn staged_video_is_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let temp = tempfile::Builder::new()
            .prefix("reelcache-")
            .suffix(".mp4")
            .tempfile_in(dir.path())
            .unwrap();
        std::fs::write(temp.path(), b"bytes").unwrap();
        let staged = StagedVideo { file: temp };

        let path = staged.path().to_path_buf();
        assert!(path.exists());

        drop(staged);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn unreachable_host_is_a_download_error() {
        let downloader =
            VideoDownloader::new(Duration::from_secs(2), None).unwrap();
        let result = downloader.download("http://127.0.0.1:9/video.mp4").await;
        assert!(matches!(result, Err(AppError::Download(_))));
    }
}
