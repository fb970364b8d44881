//! Output quality profiles and plan-based resolution.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::plan::PlanTier;

/// Frame rates accepted for rendered clips.
pub const ALLOWED_FPS: [u32; 3] = [24, 30, 60];
/// Frame rate used when none (or an unsupported one) is requested.
pub const DEFAULT_FPS: u32 = 30;

/// Vertical output resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
pub enum Resolution {
    #[default]
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "1080p")]
    P1080,
    #[serde(rename = "2k")]
    K2,
    #[serde(rename = "4k")]
    K4,
}

impl Resolution {
    pub fn parse(s: &str) -> ModelResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "720p" => Ok(Resolution::P720),
            "1080p" => Ok(Resolution::P1080),
            "2k" | "1440p" => Ok(Resolution::K2),
            "4k" | "2160p" => Ok(Resolution::K4),
            other => Err(ModelError::unknown("resolution", other)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::P720 => "720p",
            Resolution::P1080 => "1080p",
            Resolution::K2 => "2k",
            Resolution::K4 => "4k",
        }
    }

    /// Output (width, height) for a 9:16 frame.
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Resolution::P720 => (720, 1280),
            Resolution::P1080 => (1080, 1920),
            Resolution::K2 => (1440, 2560),
            Resolution::K4 => (2160, 3840),
        }
    }

    /// Target video bitrate passed to the encoder.
    pub fn video_bitrate(&self) -> &'static str {
        match self {
            Resolution::P720 => "2500k",
            Resolution::P1080 => "5000k",
            Resolution::K2 => "8000k",
            Resolution::K4 => "15000k",
        }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional look applied to rendered clips after reframing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum VisualFilter {
    #[default]
    None,
    /// Slight contrast and saturation boost
    Vivid,
    Grayscale,
}

impl VisualFilter {
    pub fn parse(s: &str) -> ModelResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "none" => Ok(VisualFilter::None),
            "vivid" => Ok(VisualFilter::Vivid),
            "grayscale" | "greyscale" | "bw" => Ok(VisualFilter::Grayscale),
            other => Err(ModelError::unknown("filter", other)),
        }
    }
}

/// Resolution and frame rate of rendered artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct QualityProfile {
    pub resolution: Resolution,
    pub fps: u32,
}

impl Default for QualityProfile {
    fn default() -> Self {
        Self {
            resolution: Resolution::P720,
            fps: DEFAULT_FPS,
        }
    }
}

impl QualityProfile {
    pub fn new(resolution: Resolution, fps: u32) -> Self {
        Self {
            resolution,
            fps: normalize_fps(fps),
        }
    }

    /// Resolve the effective profile for a plan and optional user choices.
    ///
    /// Free plans are locked to 720p/30. Paid plans honour the request, with
    /// 2k and above reserved for agency.
    pub fn for_plan(plan: PlanTier, resolution: Option<Resolution>, fps: Option<u32>) -> Self {
        if !plan.is_paid() {
            return Self::default();
        }

        let (default_res, default_fps) = match plan {
            PlanTier::Agency => (Resolution::K2, 60),
            _ => (Resolution::P1080, DEFAULT_FPS),
        };

        let mut resolution = resolution.unwrap_or(default_res);
        if plan != PlanTier::Agency && matches!(resolution, Resolution::K2 | Resolution::K4) {
            resolution = Resolution::P1080;
        }

        Self::new(resolution, fps.unwrap_or(default_fps))
    }
}

fn normalize_fps(fps: u32) -> u32 {
    if ALLOWED_FPS.contains(&fps) {
        fps
    } else {
        DEFAULT_FPS
    }
}
