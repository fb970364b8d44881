//! Stored credential (Netscape cookie file) handling.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A real Netscape cookie file is at least this many bytes.
const MIN_COOKIES_FILE_SIZE: u64 = 50;

/// File name of the per-job writable cookie copy.
const JOB_COOKIES_FILE: &str = "cookies.txt";

/// Whether `content` looks like a Netscape cookie jar.
///
/// Accepts the standard header or any tab-separated line with at least six fields.
pub fn is_valid_netscape_cookies(content: &str) -> bool {
    if content.starts_with("# Netscape HTTP Cookie File") || content.starts_with("# HTTP Cookie File") {
        return true;
    }

    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .any(|line| line.split('\t').count() >= 6)
}

/// Validate the configured cookie file and copy it into `work_dir`.
///
/// yt-dlp rewrites the jar after use, so each job gets its own copy and the
/// configured file is never touched. Returns `None` when there is nothing usable.
pub async fn prepare_cookie_file(source: &Path, work_dir: &Path) -> Option<PathBuf> {
    let meta = match tokio::fs::metadata(source).await {
        Ok(meta) => meta,
        Err(_) => {
            debug!(path = %source.display(), "No cookie file, skipping stored-credential phase");
            return None;
        }
    };

    if meta.len() < MIN_COOKIES_FILE_SIZE {
        debug!(path = %source.display(), size = meta.len(), "Cookie file too small, skipping");
        return None;
    }

    let content = match tokio::fs::read_to_string(source).await {
        Ok(content) => content,
        Err(e) => {
            warn!(path = %source.display(), "Failed to read cookie file: {}", e);
            return None;
        }
    };

    if !is_valid_netscape_cookies(&content) {
        warn!(path = %source.display(), "Cookie file is not in Netscape format, skipping");
        return None;
    }

    let copy = work_dir.join(JOB_COOKIES_FILE);
    if let Err(e) = tokio::fs::write(&copy, content).await {
        warn!("Failed to copy cookie file into job directory: {}", e);
        return None;
    }

    Some(copy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const JAR: &str = "# Netscape HTTP Cookie File\n.youtube.com\tTRUE\t/\tTRUE\t0\tSID\tabcdef0123456789\n";

    #[test]
    fn test_netscape_detection() {
        assert!(is_valid_netscape_cookies(JAR));
        assert!(is_valid_netscape_cookies(
            "# comment\n.example.com\tTRUE\t/\tFALSE\t0\tname\tvalue\n"
        ));
        assert!(!is_valid_netscape_cookies("{\"cookies\": []}"));
        assert!(!is_valid_netscape_cookies(""));
    }

    #[tokio::test]
    async fn test_prepare_copies_valid_jar() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("source.txt");
        let job_dir = dir.path().join("job");
        tokio::fs::create_dir_all(&job_dir).await.unwrap();
        tokio::fs::write(&src, JAR).await.unwrap();

        let copy = prepare_cookie_file(&src, &job_dir).await.unwrap();
        assert_eq!(copy, job_dir.join("cookies.txt"));
        assert_eq!(tokio::fs::read_to_string(copy).await.unwrap(), JAR);
    }

    #[tokio::test]
    async fn test_prepare_rejects_missing_and_tiny() {
        let dir = TempDir::new().unwrap();
        assert!(prepare_cookie_file(&dir.path().join("nope"), dir.path()).await.is_none());

        let tiny = dir.path().join("tiny.txt");
        tokio::fs::write(&tiny, "x").await.unwrap();
        assert!(prepare_cookie_file(&tiny, dir.path()).await.is_none());
    }
}
