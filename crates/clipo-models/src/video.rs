//! Video records tracked in the record store.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::plan::PlanTier;
use crate::quality::QualityProfile;

/// Video processing status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum VideoStatus {
    /// Submitted, waiting for a slot
    #[default]
    Uploaded,
    /// Pipeline running
    Processing,
    /// Clips rendered
    Finished,
    /// Pipeline failed
    Error,
}

impl VideoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoStatus::Uploaded => "uploaded",
            VideoStatus::Processing => "processing",
            VideoStatus::Finished => "finished",
            VideoStatus::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, VideoStatus::Finished | VideoStatus::Error)
    }
}

impl fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A submitted video and its processing state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VideoRecord {
    /// Assigned by the record store (0 before creation)
    #[serde(default)]
    pub id: i64,

    pub source_url: String,

    #[serde(default)]
    pub plan: PlanTier,

    pub quality: QualityProfile,

    pub clip_count: u32,

    #[serde(default)]
    pub status: VideoStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    #[serde(default)]
    pub clips_generated: u32,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl VideoRecord {
    pub fn new(
        source_url: impl Into<String>,
        plan: PlanTier,
        quality: QualityProfile,
        clip_count: u32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            source_url: source_url.into(),
            plan,
            quality,
            clip_count,
            status: VideoStatus::Uploaded,
            error_message: None,
            clips_generated: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn mark_processing(&mut self) {
        self.status = VideoStatus::Processing;
        self.error_message = None;
        self.updated_at = Utc::now();
    }

    pub fn mark_finished(&mut self, clips_generated: u32) {
        self.status = VideoStatus::Finished;
        self.clips_generated = clips_generated;
        self.updated_at = Utc::now();
    }

    pub fn mark_error(&mut self, message: impl Into<String>) {
        self.status = VideoStatus::Error;
        self.error_message = Some(message.into());
        self.updated_at = Utc::now();
    }
}
