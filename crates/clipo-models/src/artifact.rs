//! Rendered clip records.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::quality::{QualityProfile, Resolution};
use crate::window::CandidateWindow;

/// Output style of rendered clips.
pub const VERTICAL_STYLE: &str = "vertical";

/// Display metadata attached to an artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ArtifactMetadata {
    pub title: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub topic: String,
    pub resolution: Resolution,
    pub fps: u32,
}

/// One rendered clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ArtifactRecord {
    /// Assigned by the record store (0 before creation)
    #[serde(default)]
    pub id: i64,
    pub video_id: i64,
    pub start_time: f64,
    pub end_time: f64,
    pub viral_score: u8,
    pub style: String,
    pub transcript_segment: String,
    pub output_path: String,
    pub metadata: ArtifactMetadata,
    pub created_at: DateTime<Utc>,
}

impl ArtifactRecord {
    /// Describe a rendered window.
    pub fn from_window(
        video_id: i64,
        window: &CandidateWindow,
        output_path: impl Into<String>,
        quality: QualityProfile,
    ) -> Self {
        Self {
            id: 0,
            video_id,
            start_time: window.start_time,
            end_time: window.end_time,
            viral_score: window.viral_score,
            style: VERTICAL_STYLE.to_string(),
            transcript_segment: window.text.clone(),
            output_path: output_path.into(),
            metadata: ArtifactMetadata {
                title: format!("Viral Clip {}%", window.viral_score),
                reason: window.reason.clone(),
                topic: window.topic.clone(),
                resolution: quality.resolution,
                fps: quality.fps,
            },
            created_at: Utc::now(),
        }
    }

    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_window() {
        let mut window = CandidateWindow::new(12.0, 40.0, 87);
        window.topic = "money".into();
        window.text = "the quote".into();

        let rec = ArtifactRecord::from_window(5, &window, "/clips/a.mp4", QualityProfile::default());
        assert_eq!(rec.metadata.title, "Viral Clip 87%");
        assert_eq!(rec.style, "vertical");
        assert_eq!(rec.transcript_segment, "the quote");
        assert_eq!(rec.metadata.resolution, Resolution::P720);
        assert_eq!(rec.duration(), 28.0);
    }
}
