//! Structured job logging.

use tracing::{error, info, warn, Span};

use clipo_models::JobId;

/// Logs job lifecycle events with the job id and stage attached.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: JobId,
    stage: &'static str,
}

impl JobLogger {
    pub fn new(job_id: JobId, stage: &'static str) -> Self {
        Self { job_id, stage }
    }

    /// Same job, different stage.
    pub fn stage(&self, stage: &'static str) -> Self {
        Self {
            job_id: self.job_id,
            stage,
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(job_id = %self.job_id, stage = self.stage, "Job started: {}", message);
    }

    pub fn log_progress(&self, message: &str) {
        info!(job_id = %self.job_id, stage = self.stage, "Job progress: {}", message);
    }

    pub fn log_warning(&self, message: &str) {
        warn!(job_id = %self.job_id, stage = self.stage, "Job warning: {}", message);
    }

    pub fn log_error(&self, message: &str) {
        error!(job_id = %self.job_id, stage = self.stage, "Job error: {}", message);
    }

    pub fn log_completion(&self, message: &str) {
        info!(job_id = %self.job_id, stage = self.stage, "Job completed: {}", message);
    }

    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    pub fn span(&self) -> Span {
        tracing::info_span!("job", job_id = %self.job_id, stage = self.stage)
    }
}
