//! Shared data models for the Clipo backend.
//!
//! This crate provides Serde-serializable types for:
//! - Jobs, plans and quality profiles
//! - Transcript segments and highlight windows
//! - Video and artifact records
//! - Scheduler status snapshots

pub mod artifact;
pub mod encoding;
pub mod error;
pub mod job;
pub mod locator;
pub mod plan;
pub mod quality;
pub mod segment;
pub mod status;
pub mod video;
pub mod window;

// Re-export common types
pub use artifact::{ArtifactMetadata, ArtifactRecord, VERTICAL_STYLE};
pub use encoding::{EncodingConfig, VideoEncoder};
pub use error::{ModelError, ModelResult};
pub use job::{clamp_clip_count, Job, JobId, DEFAULT_CLIP_COUNT, MAX_CLIP_COUNT, MIN_CLIP_COUNT};
pub use locator::SourceLocator;
pub use plan::PlanTier;
pub use quality::{QualityProfile, Resolution, VisualFilter};
pub use segment::{format_transcript, sort_segments, ContentSegment};
pub use status::{ActiveTask, QueueStatus, SchedulerStatistics, SubmitOutcome};
pub use video::{VideoRecord, VideoStatus};
pub use window::{
    CandidateWindow, SelectedWindow, EXPANDABLE_DURATION, MAX_DURATION, MIN_DURATION,
    OVERLAP_TOLERANCE,
};
