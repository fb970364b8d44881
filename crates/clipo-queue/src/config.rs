//! Scheduler configuration.

use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Number of execution slots
    pub max_processes: usize,
    /// Durable queue mirror
    pub queue_file: PathBuf,
    /// Promoter polling interval
    pub promoter_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_processes: 2,
            queue_file: PathBuf::from("storage/queue.json"),
            promoter_interval: Duration::from_secs(2),
        }
    }
}

impl SchedulerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_processes: std::env::var("MAX_PROCESSES")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.max_processes),
            queue_file: std::env::var("QUEUE_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.queue_file),
            promoter_interval: Duration::from_secs(
                std::env::var("PROMOTER_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .filter(|n: &u64| *n > 0)
                    .unwrap_or(2),
            ),
        }
    }

    pub fn with_max_processes(mut self, max_processes: usize) -> Self {
        self.max_processes = max_processes.max(1);
        self
    }

    pub fn with_queue_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.queue_file = path.into();
        self
    }
}
