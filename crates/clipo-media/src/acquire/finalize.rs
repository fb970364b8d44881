//! Recovery of downloads left behind as `.part` files.

use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::error::{MediaError, MediaResult};
use crate::fs_utils::{file_size, move_file};

/// Waits before each rename attempt of a leftover `.part` file.
pub const DEFAULT_PART_RETRY_DELAYS: [Duration; 2] =
    [Duration::from_secs(2), Duration::from_secs(5)];

/// Path yt-dlp uses while a download is in flight.
pub fn part_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

/// Make sure a finished download is present at `path`.
///
/// If only `<path>.part` exists (the downloader still held the handle when it
/// exited), the rename is retried after each delay. When every rename fails a
/// non-empty `.part` file is accepted as is.
pub async fn finalize_download(path: &Path, delays: &[Duration]) -> MediaResult<PathBuf> {
    if file_size(path).await.is_some_and(|size| size > 0) {
        return Ok(path.to_path_buf());
    }

    let part = part_path(path);
    if file_size(&part).await.is_none() {
        return Err(MediaError::download_failed(format!(
            "output file not created: {}",
            path.display()
        )));
    }

    warn!(part = %part.display(), "Download left a .part file, attempting rename");

    for (attempt, delay) in delays.iter().enumerate() {
        tokio::time::sleep(*delay).await;
        match move_file(&part, path).await {
            Ok(()) => {
                info!(attempt = attempt + 1, path = %path.display(), "Renamed .part file");
                return Ok(path.to_path_buf());
            }
            Err(e) => warn!(attempt = attempt + 1, "Rename of .part file failed: {}", e),
        }
    }

    match file_size(&part).await {
        Some(size) if size > 0 => {
            warn!(part = %part.display(), "Using .part file directly");
            Ok(part)
        }
        _ => Err(MediaError::download_failed("partial download is empty")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_part_path() {
        assert_eq!(
            part_path(Path::new("/tmp/job_1/source.mp4")),
            PathBuf::from("/tmp/job_1/source.mp4.part")
        );
    }

    #[tokio::test]
    async fn test_complete_file_is_accepted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("source.mp4");
        tokio::fs::write(&path, b"video").await.unwrap();
        assert_eq!(finalize_download(&path, &[]).await.unwrap(), path);
    }

    #[tokio::test(start_paused = true)]
    async fn test_part_file_is_renamed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("source.mp4");
        tokio::fs::write(part_path(&path), b"video").await.unwrap();

        let result = finalize_download(&path, &DEFAULT_PART_RETRY_DELAYS).await.unwrap();
        assert_eq!(result, path);
        assert!(!part_path(&path).exists());
    }

    #[tokio::test]
    async fn test_missing_output_fails() {
        let dir = TempDir::new().unwrap();
        let err = finalize_download(&dir.path().join("x.mp4"), &[]).await.unwrap_err();
        assert!(matches!(err, MediaError::DownloadFailed { .. }));
    }
}
