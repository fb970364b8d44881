//! Video encoding configuration.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::quality::QualityProfile;

/// Software encoder preset
pub const SOFTWARE_PRESET: &str = "superfast";
/// Default audio codec
pub const DEFAULT_AUDIO_CODEC: &str = "aac";
/// Default audio bitrate
pub const DEFAULT_AUDIO_BITRATE: &str = "128k";

/// H.264 encoders, hardware first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum VideoEncoder {
    Nvenc,
    Qsv,
    VideoToolbox,
    X264,
}

impl VideoEncoder {
    /// Hardware encoders in probing order.
    pub const HARDWARE: [VideoEncoder; 3] =
        [VideoEncoder::Nvenc, VideoEncoder::Qsv, VideoEncoder::VideoToolbox];

    /// FFmpeg codec name.
    pub fn codec_name(&self) -> &'static str {
        match self {
            VideoEncoder::Nvenc => "h264_nvenc",
            VideoEncoder::Qsv => "h264_qsv",
            VideoEncoder::VideoToolbox => "h264_videotoolbox",
            VideoEncoder::X264 => "libx264",
        }
    }

    pub fn is_hardware(&self) -> bool {
        !matches!(self, VideoEncoder::X264)
    }

    fn preset(&self) -> Option<&'static str> {
        match self {
            VideoEncoder::Nvenc => Some("p4"),
            VideoEncoder::Qsv => Some("faster"),
            VideoEncoder::VideoToolbox => None,
            VideoEncoder::X264 => Some(SOFTWARE_PRESET),
        }
    }
}

/// Video encoding configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EncodingConfig {
    pub encoder: VideoEncoder,

    /// Target video bitrate (e.g. "5000k")
    pub video_bitrate: String,

    /// Output frame rate
    pub fps: u32,

    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,
}

fn default_audio_codec() -> String {
    DEFAULT_AUDIO_CODEC.to_string()
}
fn default_audio_bitrate() -> String {
    DEFAULT_AUDIO_BITRATE.to_string()
}

impl EncodingConfig {
    /// Software configuration for a quality profile.
    pub fn for_quality(quality: &QualityProfile) -> Self {
        Self {
            encoder: VideoEncoder::X264,
            video_bitrate: quality.resolution.video_bitrate().to_string(),
            fps: quality.fps,
            audio_codec: default_audio_codec(),
            audio_bitrate: default_audio_bitrate(),
        }
    }

    /// Same settings on a different encoder.
    pub fn with_encoder(mut self, encoder: VideoEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    /// Convert to FFmpeg output arguments.
    pub fn to_ffmpeg_args(&self) -> Vec<String> {
        let mut args = vec!["-c:v".to_string(), self.encoder.codec_name().to_string()];

        if let Some(preset) = self.encoder.preset() {
            args.extend_from_slice(&["-preset".to_string(), preset.to_string()]);
        }

        args.extend_from_slice(&[
            "-b:v".to_string(),
            self.video_bitrate.clone(),
            "-r".to_string(),
            self.fps.to_string(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
            "-c:a".to_string(),
            self.audio_codec.clone(),
            "-b:a".to_string(),
            self.audio_bitrate.clone(),
            "-movflags".to_string(),
            "+faststart".to_string(),
        ]);

        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::Resolution;

    #[test]
    fn test_software_config() {
        let config = EncodingConfig::for_quality(&QualityProfile::new(Resolution::P1080, 60));
        let args = config.to_ffmpeg_args();
        assert!(args.contains(&"libx264".to_string()));
        assert!(args.contains(&"superfast".to_string()));
        assert!(args.contains(&"5000k".to_string()));
        assert!(args.contains(&"60".to_string()));
    }

    #[test]
    fn test_hardware_config() {
        let config = EncodingConfig::for_quality(&QualityProfile::default())
            .with_encoder(VideoEncoder::VideoToolbox);
        let args = config.to_ffmpeg_args();
        assert!(args.contains(&"h264_videotoolbox".to_string()));
        assert!(!args.contains(&"-preset".to_string()));
        assert!(VideoEncoder::VideoToolbox.is_hardware());
        assert!(!VideoEncoder::X264.is_hardware());
    }
}
