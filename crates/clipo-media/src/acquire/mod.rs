//! Source acquisition with an ordered fallback chain.
//!
//! Media hosts block automated clients inconsistently, so a download is
//! attempted through progressively more privileged strategies:
//!
//! 1. a stored cookie file, if one is configured and valid
//! 2. unauthenticated requests posing as several client identities
//! 3. session state borrowed from locally installed browsers
//! 4. an interactive device-authorization flow (two variants)
//!
//! A cheap metadata probe runs first so over-long sources are rejected
//! before any media is transferred.

pub mod cookies;
pub mod finalize;
pub mod strategy;
pub mod ytdlp;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tracing::{debug, info, warn};

use crate::error::{MediaError, MediaResult};

pub use finalize::{finalize_download, part_path, DEFAULT_PART_RETRY_DELAYS};
pub use strategy::{AccessStrategy, AcquisitionPhase, DeviceAuthVariant, BROWSERS, CLIENT_PROFILES};
pub use ytdlp::{Downloader, MetadataProbe, YtDlp};

/// Longest source accepted, in seconds.
pub const DEFAULT_MAX_SOURCE_DURATION_SECS: u64 = 600;

/// Failure reasons are cut to this many characters in logs.
const REASON_MAX_CHARS: usize = 100;

/// Acquisition settings.
#[derive(Debug, Clone)]
pub struct AcquireConfig {
    /// Sources longer than this are refused
    pub max_duration_secs: u64,
    /// Netscape cookie file for the stored-credential phase
    pub cookies_path: Option<PathBuf>,
    /// Per-strategy download timeout
    pub download_timeout: Duration,
    /// Waits between `.part` rename attempts
    pub part_retry_delays: Vec<Duration>,
}

impl Default for AcquireConfig {
    fn default() -> Self {
        Self {
            max_duration_secs: DEFAULT_MAX_SOURCE_DURATION_SECS,
            cookies_path: Some(PathBuf::from("storage/cookies.txt")),
            download_timeout: Duration::from_secs(600),
            part_retry_delays: DEFAULT_PART_RETRY_DELAYS.to_vec(),
        }
    }
}

impl AcquireConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_duration_secs: std::env::var("MAX_SOURCE_DURATION_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_duration_secs),
            cookies_path: std::env::var("YTDLP_COOKIES_PATH")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from)
                .or(defaults.cookies_path),
            download_timeout: std::env::var("DOWNLOAD_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.download_timeout),
            part_retry_delays: defaults.part_retry_delays,
        }
    }
}

/// Runs the probe and the fallback chain.
#[derive(Clone)]
pub struct Acquirer {
    config: AcquireConfig,
    probe: Arc<dyn MetadataProbe>,
    downloader: Arc<dyn Downloader>,
}

impl Acquirer {
    pub fn new(
        config: AcquireConfig,
        probe: Arc<dyn MetadataProbe>,
        downloader: Arc<dyn Downloader>,
    ) -> Self {
        Self {
            config,
            probe,
            downloader,
        }
    }

    /// Acquirer backed by yt-dlp for both probing and downloading.
    pub fn with_ytdlp(config: AcquireConfig) -> Self {
        let ytdlp = Arc::new(YtDlp::new(config.download_timeout));
        Self::new(config, ytdlp.clone(), ytdlp)
    }

    pub fn config(&self) -> &AcquireConfig {
        &self.config
    }

    /// Download `locator` to `destination`, returning the path of the usable file.
    ///
    /// The returned path is `destination` unless an unrenamable `.part` file had
    /// to be accepted.
    pub async fn acquire(&self, locator: &str, destination: &Path) -> MediaResult<PathBuf> {
        self.check_duration(locator).await?;

        let work_dir = destination
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        tokio::fs::create_dir_all(&work_dir).await?;

        let cookies = match &self.config.cookies_path {
            Some(path) => cookies::prepare_cookie_file(path, &work_dir).await,
            None => None,
        };

        let mut attempts = 0usize;
        let mut last_error = String::from("no strategy was attempted");

        for phase in AcquisitionPhase::ALL {
            let strategies = phase.strategies(cookies.as_ref());
            if strategies.is_empty() {
                debug!(phase = %phase, "Phase has no strategies, skipping");
                continue;
            }

            info!(phase = %phase, number = phase.number(), "Starting acquisition phase");

            for strategy in strategies {
                attempts += 1;
                let result = match self.downloader.download(locator, destination, &strategy).await {
                    Ok(()) => finalize_download(destination, &self.config.part_retry_delays).await,
                    Err(e) => Err(e),
                };

                match result {
                    Ok(path) => {
                        counter!("clipo_acquire_phase_total", "phase" => phase.as_str(), "outcome" => "success")
                            .increment(1);
                        info!(
                            phase = %phase,
                            strategy = %strategy,
                            path = %path.display(),
                            "Acquisition succeeded"
                        );
                        return Ok(path);
                    }
                    Err(e) => {
                        counter!("clipo_acquire_phase_total", "phase" => phase.as_str(), "outcome" => "failure")
                            .increment(1);
                        let reason = truncate_reason(&e.to_string(), REASON_MAX_CHARS);
                        warn!(phase = %phase, strategy = %strategy, "Acquisition attempt failed: {}", reason);
                        last_error = reason;
                    }
                }
            }
        }

        Err(MediaError::AcquisitionExhausted {
            phases: attempts,
            last_error,
        })
    }

    async fn check_duration(&self, locator: &str) -> MediaResult<()> {
        let duration = self.probe.duration(locator).await?;
        if duration > self.config.max_duration_secs as f64 {
            warn!(
                duration_secs = duration,
                limit_secs = self.config.max_duration_secs,
                "Source exceeds duration limit"
            );
            return Err(MediaError::SourceTooLong {
                duration_secs: duration,
                limit_secs: self.config.max_duration_secs,
            });
        }
        debug!(duration_secs = duration, "Source duration within limit");
        Ok(())
    }
}

/// Cut `reason` to at most `max` characters.
pub fn truncate_reason(reason: &str, max: usize) -> String {
    match reason.char_indices().nth(max) {
        Some((idx, _)) => reason[..idx].to_string(),
        None => reason.to_string(),
    }
}
