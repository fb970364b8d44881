//! Decode/encode primitives used by the pipeline.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use clipo_models::{EncodingConfig, QualityProfile, VideoEncoder, VisualFilter};

use crate::command::{detect_hardware_encoders, CommandRunner, FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::filters::build_vertical_filter;
use crate::probe::probe_video;
use crate::watermark::{build_vf_with_watermark, WatermarkConfig};

/// Audio settings for transcription input: mono, 16 kHz, low bitrate.
const TRANSCRIPTION_SAMPLE_RATE: u32 = 16_000;
const TRANSCRIPTION_BITRATE: &str = "24k";

/// What to render for one window.
#[derive(Debug, Clone)]
pub struct ClipSpec {
    pub start: f64,
    pub end: f64,
    pub quality: QualityProfile,
    pub visual: VisualFilter,
    pub watermark: bool,
}

impl ClipSpec {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Cut/crop/resize/filter/encode over local files.
#[async_trait]
pub trait MediaEncoder: Send + Sync {
    /// Duration of a local media file, in seconds.
    async fn duration(&self, source: &Path) -> MediaResult<f64>;

    /// Extract the audio track in a form suited to transcription.
    async fn extract_audio(&self, source: &Path, output: &Path) -> MediaResult<()>;

    /// Render one vertical clip. Returns the encoder that produced it.
    async fn encode_clip(&self, source: &Path, output: &Path, spec: &ClipSpec) -> MediaResult<VideoEncoder>;
}

/// FFmpeg implementation with hardware-first encoding.
pub struct FfmpegEncoder {
    runner: Arc<dyn CommandRunner>,
    watermark: WatermarkConfig,
    use_hardware: bool,
    hardware: OnceCell<Option<VideoEncoder>>,
}

impl FfmpegEncoder {
    pub fn new(watermark: WatermarkConfig) -> Self {
        Self {
            runner: Arc::new(FfmpegRunner::new()),
            watermark,
            use_hardware: true,
            hardware: OnceCell::new(),
        }
    }

    /// Kill any single FFmpeg run after `secs` seconds.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.runner = Arc::new(FfmpegRunner::new().with_timeout(secs));
        self
    }

    /// Run commands through `runner` instead of a local FFmpeg.
    pub fn with_runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = runner;
        self
    }

    /// Use `encoder` as the hardware encoder without probing FFmpeg for one.
    pub fn with_hardware_encoder(mut self, encoder: VideoEncoder) -> Self {
        self.use_hardware = true;
        self.hardware = OnceCell::new_with(Some(Some(encoder)));
        self
    }

    /// Skip hardware probing and always use the software encoder.
    pub fn software_only(mut self) -> Self {
        self.use_hardware = false;
        self
    }

    /// First hardware encoder the local FFmpeg offers, probed once.
    async fn hardware_encoder(&self) -> Option<VideoEncoder> {
        if !self.use_hardware {
            return None;
        }
        *self
            .hardware
            .get_or_init(|| async {
                let found = detect_hardware_encoders().await.into_iter().next();
                match found {
                    Some(enc) => info!(encoder = enc.codec_name(), "Hardware encoder available"),
                    None => info!("No hardware encoder found, using libx264"),
                }
                found
            })
            .await
    }

    fn build_clip_command(
        &self,
        source: &Path,
        output: &Path,
        spec: &ClipSpec,
        encoder: VideoEncoder,
    ) -> FfmpegCommand {
        let base = build_vertical_filter(&spec.quality, spec.visual);
        let (width, _) = spec.quality.resolution.dimensions();

        let filter = if spec.watermark {
            build_vf_with_watermark(&base, width, &self.watermark).unwrap_or_else(|| {
                warn!(path = %self.watermark.image_path, "Watermark missing, rendering without it");
                base.clone()
            })
        } else {
            base
        };

        let encoding = EncodingConfig::for_quality(&spec.quality).with_encoder(encoder);

        FfmpegCommand::new(source, output)
            .seek(spec.start)
            .duration(spec.duration())
            .video_filter(filter)
            .output_args(encoding.to_ffmpeg_args())
    }
}

#[async_trait]
impl MediaEncoder for FfmpegEncoder {
    async fn duration(&self, source: &Path) -> MediaResult<f64> {
        Ok(probe_video(source).await?.duration)
    }

    async fn extract_audio(&self, source: &Path, output: &Path) -> MediaResult<()> {
        let cmd = FfmpegCommand::new(source, output)
            .no_video()
            .audio_channels(1)
            .audio_sample_rate(TRANSCRIPTION_SAMPLE_RATE)
            .audio_codec("libmp3lame")
            .audio_bitrate(TRANSCRIPTION_BITRATE);
        self.runner.run(&cmd).await
    }

    async fn encode_clip(&self, source: &Path, output: &Path, spec: &ClipSpec) -> MediaResult<VideoEncoder> {
        if spec.duration() <= 0.0 {
            return Err(MediaError::invalid_video(format!(
                "empty clip range {:.2}-{:.2}",
                spec.start, spec.end
            )));
        }

        if let Some(hw) = self.hardware_encoder().await {
            let cmd = self.build_clip_command(source, output, spec, hw);
            match self.runner.run(&cmd).await {
                Ok(()) => return Ok(hw),
                Err(e) => {
                    warn!(encoder = hw.codec_name(), "Hardware encode failed, falling back to libx264: {}", e);
                    let _ = tokio::fs::remove_file(output).await;
                }
            }
        }

        let cmd = self.build_clip_command(source, output, spec, VideoEncoder::X264);
        debug!(output = %output.display(), "Encoding with libx264");
        self.runner.run(&cmd).await?;
        Ok(VideoEncoder::X264)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipo_models::Resolution;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Fails every run using `failing_codec` after writing a partial output.
    struct ScriptedRunner {
        failing_codec: &'static str,
        output: PathBuf,
        /// Codec of each run and whether the output already existed
        calls: Mutex<Vec<(String, bool)>>,
    }

    impl ScriptedRunner {
        fn new(failing_codec: &'static str, output: PathBuf) -> Self {
            Self {
                failing_codec,
                output,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CommandRunner for ScriptedRunner {
        async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
            let args = cmd.build_args();
            let codec = args
                .windows(2)
                .find(|w| w[0] == "-c:v")
                .map(|w| w[1].clone())
                .unwrap_or_default();
            self.calls.lock().unwrap().push((codec.clone(), self.output.exists()));

            if codec == self.failing_codec {
                tokio::fs::write(&self.output, b"partial").await?;
                return Err(MediaError::ffmpeg_failed("encoder init failed", None, Some(1)));
            }
            tokio::fs::write(&self.output, b"complete").await?;
            Ok(())
        }
    }

    fn spec(watermark: bool) -> ClipSpec {
        ClipSpec {
            start: 12.5,
            end: 40.0,
            quality: QualityProfile::new(Resolution::P1080, 30),
            visual: VisualFilter::None,
            watermark,
        }
    }

    #[test]
    fn test_clip_command_software() {
        let encoder = FfmpegEncoder::new(WatermarkConfig::default()).software_only();
        let args = encoder
            .build_clip_command(Path::new("src.mp4"), Path::new("out.mp4"), &spec(false), VideoEncoder::X264)
            .build_args();

        assert!(args.windows(2).any(|w| w[0] == "-ss" && w[1] == "12.500"));
        assert!(args.windows(2).any(|w| w[0] == "-t" && w[1] == "27.500"));
        assert!(args.windows(2).any(|w| w[0] == "-c:v" && w[1] == "libx264"));
        assert!(args.windows(2).any(|w| w[0] == "-b:v" && w[1] == "5000k"));
    }

    #[test]
    fn test_missing_watermark_falls_back_to_plain_filter() {
        let encoder = FfmpegEncoder::new(WatermarkConfig::default().with_image_path("/missing.png"));
        let args = encoder
            .build_clip_command(Path::new("src.mp4"), Path::new("out.mp4"), &spec(true), VideoEncoder::Nvenc)
            .build_args();

        let vf = args.iter().position(|a| a == "-vf").unwrap();
        assert!(!args[vf + 1].contains("movie="));
        assert!(args.contains(&"h264_nvenc".to_string()));
    }

    #[tokio::test]
    async fn test_hardware_failure_falls_back_to_libx264() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("clip.mp4");
        let runner = Arc::new(ScriptedRunner::new("h264_nvenc", output.clone()));
        let encoder = FfmpegEncoder::new(WatermarkConfig::default())
            .with_runner(runner.clone())
            .with_hardware_encoder(VideoEncoder::Nvenc);

        let used = encoder
            .encode_clip(Path::new("src.mp4"), &output, &spec(false))
            .await
            .unwrap();

        assert_eq!(used, VideoEncoder::X264);
        // the partial hardware output is gone before the software run starts
        let calls = runner.calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![("h264_nvenc".to_string(), false), ("libx264".to_string(), false)]
        );
        assert_eq!(std::fs::read(&output).unwrap(), b"complete");
    }

    #[tokio::test]
    async fn test_hardware_success_skips_software() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("clip.mp4");
        let runner = Arc::new(ScriptedRunner::new("libx264", output.clone()));
        let encoder = FfmpegEncoder::new(WatermarkConfig::default())
            .with_runner(runner.clone())
            .with_hardware_encoder(VideoEncoder::Qsv);

        let used = encoder
            .encode_clip(Path::new("src.mp4"), &output, &spec(false))
            .await
            .unwrap();

        assert_eq!(used, VideoEncoder::Qsv);
        assert_eq!(runner.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rejects_empty_range() {
        let encoder = FfmpegEncoder::new(WatermarkConfig::default()).software_only();
        let mut bad = spec(false);
        bad.end = bad.start;
        let err = encoder
            .encode_clip(Path::new("src.mp4"), Path::new("out.mp4"), &bad)
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::InvalidVideo(_)));
    }
}
