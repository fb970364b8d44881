//! Worker configuration.

use std::path::PathBuf;

use clipo_media::DEFAULT_WATERMARK_PATH;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Parent of the per-job working directories
    pub work_dir: PathBuf,
    /// Where rendered clips are written
    pub clips_dir: PathBuf,
    /// Maximum concurrent FFmpeg renders per job
    pub render_workers: usize,
    /// Upper bound on a single FFmpeg run, in seconds
    pub render_timeout_secs: u64,
    /// Transcript chunk size, in characters
    pub analysis_chunk_chars: usize,
    /// Reasoning attempts per chunk
    pub analysis_attempts: u32,
    /// Free-plan watermark image
    pub watermark_path: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("storage/temp"),
            clips_dir: PathBuf::from("storage/clips"),
            render_workers: 2,
            render_timeout_secs: 900,
            analysis_chunk_chars: 30_000,
            analysis_attempts: 3,
            watermark_path: DEFAULT_WATERMARK_PATH.to_string(),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            work_dir: std::env::var("WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            clips_dir: std::env::var("CLIPS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.clips_dir),
            render_workers: std::env::var("RENDER_WORKERS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.render_workers),
            render_timeout_secs: std::env::var("RENDER_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n: &u64| *n > 0)
                .unwrap_or(defaults.render_timeout_secs),
            analysis_chunk_chars: std::env::var("ANALYSIS_CHUNK_CHARS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n: &usize| *n >= 1_000)
                .unwrap_or(defaults.analysis_chunk_chars),
            analysis_attempts: std::env::var("ANALYSIS_ATTEMPTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n: &u32| *n > 0)
                .unwrap_or(defaults.analysis_attempts),
            watermark_path: std::env::var("WATERMARK_PATH").unwrap_or(defaults.watermark_path),
        }
    }

    /// Private scratch directory of one job.
    pub fn job_dir(&self, job_id: i64) -> PathBuf {
        self.work_dir.join(format!("job_{}", job_id))
    }

    /// Kept transcript of one job, stored beside its clips.
    pub fn transcript_path(&self, job_id: i64) -> PathBuf {
        self.clips_dir.join(format!("transcript_{}.txt", job_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_dir() {
        let config = WorkerConfig::default();
        assert_eq!(config.job_dir(7), PathBuf::from("storage/temp/job_7"));
        assert_eq!(
            config.transcript_path(7),
            PathBuf::from("storage/clips/transcript_7.txt")
        );
        assert_eq!(config.render_workers, 2);
        assert_eq!(config.render_timeout_secs, 900);
        assert_eq!(config.analysis_chunk_chars, 30_000);
    }
}
