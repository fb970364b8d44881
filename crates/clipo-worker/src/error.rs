//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Job failed: {0}")]
    JobFailed(String),

    /// Reasoning output that no repair step could turn into records.
    #[error("Malformed analysis output: {0}")]
    AnalysisMalformed(String),

    #[error("No valid clips found")]
    NoValidClips,

    #[error("Render of clip {index} failed: {message}")]
    RenderFailed { index: usize, message: String },

    #[error("Transcription failed: {0}")]
    TranscriptionFailed(String),

    #[error("Media error: {0}")]
    Media(#[from] clipo_media::MediaError),

    #[error("ML service error: {0}")]
    Ml(#[from] clipo_ml_client::MlError),

    #[error("Store error: {0}")]
    Store(#[from] clipo_store::StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn job_failed(msg: impl Into<String>) -> Self {
        Self::JobFailed(msg.into())
    }

    pub fn analysis_malformed(msg: impl Into<String>) -> Self {
        Self::AnalysisMalformed(msg.into())
    }

    pub fn render_failed(index: usize, msg: impl Into<String>) -> Self {
        Self::RenderFailed {
            index,
            message: msg.into(),
        }
    }

    pub fn transcription_failed(msg: impl Into<String>) -> Self {
        Self::TranscriptionFailed(msg.into())
    }
}
