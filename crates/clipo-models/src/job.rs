//! Job definitions for the scheduler.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ModelError, ModelResult};
use crate::locator::SourceLocator;
use crate::plan::PlanTier;
use crate::quality::{QualityProfile, VisualFilter};

/// Smallest number of clips a job may request.
pub const MIN_CLIP_COUNT: u32 = 3;
/// Largest number of clips a job may request.
pub const MAX_CLIP_COUNT: u32 = 24;
/// Clip count used when the caller does not ask for one.
pub const DEFAULT_CLIP_COUNT: u32 = 12;

/// Integer identifier of a job. Shared with the video record it processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub i64);

impl JobId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for JobId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// A clip-generation request. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Job {
    /// Job ID (equal to the video record id)
    pub id: JobId,

    /// Remote media locator
    pub source: SourceLocator,

    /// Output quality
    pub quality: QualityProfile,

    /// Number of clips requested
    pub clip_count: u32,

    /// Plan of the submitting user
    #[serde(default)]
    pub plan: PlanTier,

    /// Look applied to every rendered clip
    #[serde(default)]
    pub visual: VisualFilter,

    /// Submission timestamp
    pub submitted_at: DateTime<Utc>,
}

impl Job {
    /// Build a job, validating the locator and clamping the clip count.
    pub fn new(
        id: impl Into<JobId>,
        source: &str,
        quality: QualityProfile,
        clip_count: Option<u32>,
        plan: PlanTier,
    ) -> ModelResult<Self> {
        let source = SourceLocator::parse(source)
            .map_err(|e| ModelError::invalid_job(e.to_string()))?;

        Ok(Self {
            id: id.into(),
            source,
            quality,
            clip_count: clamp_clip_count(clip_count.unwrap_or(DEFAULT_CLIP_COUNT)),
            plan,
            visual: VisualFilter::None,
            submitted_at: Utc::now(),
        })
    }

    pub fn with_visual(mut self, visual: VisualFilter) -> Self {
        self.visual = visual;
        self
    }

    /// Re-check invariants on a job that came from outside (e.g. a queue file).
    pub fn validate(&self) -> ModelResult<()> {
        if !(MIN_CLIP_COUNT..=MAX_CLIP_COUNT).contains(&self.clip_count) {
            return Err(ModelError::invalid_job(format!(
                "clip_count {} outside {}..={}",
                self.clip_count, MIN_CLIP_COUNT, MAX_CLIP_COUNT
            )));
        }
        Ok(())
    }
}

/// Clamp a requested clip count into the supported range.
pub fn clamp_clip_count(requested: u32) -> u32 {
    requested.clamp(MIN_CLIP_COUNT, MAX_CLIP_COUNT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_job_clamps_count() {
        let job = Job::new(7, "https://youtu.be/abc", QualityProfile::default(), Some(100), PlanTier::Pro)
            .unwrap();
        assert_eq!(job.clip_count, MAX_CLIP_COUNT);
        assert_eq!(job.id, JobId(7));

        let job = Job::new(8, "https://youtu.be/abc", QualityProfile::default(), Some(0), PlanTier::Free)
            .unwrap();
        assert_eq!(job.clip_count, MIN_CLIP_COUNT);

        let job = Job::new(9, "https://youtu.be/abc", QualityProfile::default(), None, PlanTier::Free)
            .unwrap();
        assert_eq!(job.clip_count, DEFAULT_CLIP_COUNT);
    }

    #[test]
    fn test_visual_survives_queue_file() {
        let job = Job::new(4, "https://youtu.be/abc", QualityProfile::default(), None, PlanTier::Pro)
            .unwrap()
            .with_visual(VisualFilter::Grayscale);
        let json = serde_json::to_value(&job).unwrap();
        assert_eq!(json["visual"], "grayscale");

        let mut legacy = json;
        legacy.as_object_mut().unwrap().remove("visual");
        let back: Job = serde_json::from_value(legacy).unwrap();
        assert_eq!(back.visual, VisualFilter::None);
    }

    #[test]
    fn test_new_job_rejects_bad_locator() {
        let err = Job::new(1, "youtube", QualityProfile::default(), None, PlanTier::Free).unwrap_err();
        assert!(matches!(err, ModelError::InvalidJobParameters(_)));
    }

    #[test]
    fn test_job_roundtrip_and_validate() {
        let job = Job::new(3, "https://example.com/v", QualityProfile::default(), Some(5), PlanTier::Agency)
            .unwrap();
        let json = serde_json::to_string(&job).unwrap();
        let back: Job = serde_json::from_str(&json).unwrap();
        assert_eq!(back, job);
        assert!(back.validate().is_ok());

        assert_eq!(back.visual, VisualFilter::None);

        let mut broken = back;
        broken.clip_count = 99;
        assert!(broken.validate().is_err());
    }
}
