//! yt-dlp backed downloader.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::acquire::strategy::AccessStrategy;
use crate::command::check_ytdlp;
use crate::error::{MediaError, MediaResult};
use crate::probe::probe_remote_duration;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const FORMAT_SELECTOR: &str = "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best";

/// Fetches metadata for a locator without downloading media.
#[async_trait]
pub trait MetadataProbe: Send + Sync {
    /// Source duration in seconds.
    async fn duration(&self, locator: &str) -> MediaResult<f64>;
}

/// Downloads a locator to a path using one access strategy.
#[async_trait]
pub trait Downloader: Send + Sync {
    async fn download(&self, locator: &str, output: &Path, strategy: &AccessStrategy) -> MediaResult<()>;
}

/// yt-dlp implementation of both acquisition seams.
#[derive(Debug, Clone)]
pub struct YtDlp {
    timeout: Duration,
}

impl YtDlp {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Full argument list for a download.
    pub fn build_args(locator: &str, output: &Path, strategy: &AccessStrategy) -> Vec<String> {
        let mut args = vec![
            "--no-playlist".to_string(),
            "--newline".to_string(),
            "--user-agent".to_string(),
            USER_AGENT.to_string(),
            "-f".to_string(),
            FORMAT_SELECTOR.to_string(),
            "--merge-output-format".to_string(),
            "mp4".to_string(),
            "-o".to_string(),
            output.to_string_lossy().to_string(),
        ];
        args.extend(strategy.ytdlp_args());
        args.push(locator.to_string());
        args
    }
}

#[async_trait]
impl MetadataProbe for YtDlp {
    async fn duration(&self, locator: &str) -> MediaResult<f64> {
        probe_remote_duration(locator).await
    }
}

#[async_trait]
impl Downloader for YtDlp {
    async fn download(&self, locator: &str, output: &Path, strategy: &AccessStrategy) -> MediaResult<()> {
        check_ytdlp()?;

        let args = Self::build_args(locator, output, strategy);
        debug!(strategy = %strategy, "Running yt-dlp {}", args.join(" "));

        let mut child = Command::new("yt-dlp")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| MediaError::internal("yt-dlp stderr not captured"))?;
        let interactive = strategy.is_interactive();

        // Device flows print the login code on stderr; surface it to the operator.
        let reader = tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            let mut last_line = String::new();
            let mut last_error = None;
            while let Ok(Some(line)) = lines.next_line().await {
                if interactive {
                    info!(target: "clipo::acquire", "{}", line);
                }
                if line.starts_with("ERROR") {
                    last_error = Some(line.clone());
                }
                last_line = line;
            }
            last_error.unwrap_or(last_line)
        });

        let status = match tokio::time::timeout(self.timeout, child.wait()).await {
            Ok(status) => status?,
            Err(_) => {
                warn!(strategy = %strategy, "yt-dlp timed out, killing process");
                let _ = child.kill().await;
                return Err(MediaError::Timeout(self.timeout.as_secs()));
            }
        };

        let last_error = reader.await.unwrap_or_default();

        if status.success() {
            Ok(())
        } else {
            Err(MediaError::download_failed(if last_error.is_empty() {
                format!("yt-dlp exited with {}", status)
            } else {
                last_error
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquire::strategy::DeviceAuthVariant;

    #[test]
    fn test_build_args() {
        let args = YtDlp::build_args(
            "https://youtu.be/abc",
            Path::new("/tmp/job_1/source.mp4"),
            &AccessStrategy::BrowserSession("firefox"),
        );
        assert_eq!(args.last().unwrap(), "https://youtu.be/abc");
        let o = args.iter().position(|a| a == "-o").unwrap();
        assert_eq!(args[o + 1], "/tmp/job_1/source.mp4");
        assert!(args.windows(2).any(|w| w[0] == "--cookies-from-browser" && w[1] == "firefox"));
    }

    #[test]
    fn test_device_auth_args() {
        let args = YtDlp::build_args(
            "https://youtu.be/abc",
            Path::new("out.mp4"),
            &AccessStrategy::DeviceAuthorization(DeviceAuthVariant::Default),
        );
        assert!(args.windows(2).any(|w| w[0] == "--username" && w[1] == "oauth2"));
    }
}
