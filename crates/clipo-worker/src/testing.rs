//! Test doubles for the pipeline's external capabilities.

use std::collections::{HashSet, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use clipo_media::{ClipSpec, MediaEncoder, MediaError, MediaResult};
use clipo_ml_client::{MlResult, ReasoningClient, Transcriber};
use clipo_models::{ContentSegment, VideoEncoder, VisualFilter};

/// Encoder that writes placeholder files and fails on chosen start times.
pub struct FakeEncoder {
    duration: f64,
    failing_starts: HashSet<u64>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub encoded: AtomicUsize,
    /// Look requested by every encode call, in call order
    pub visuals: Mutex<Vec<VisualFilter>>,
}

impl FakeEncoder {
    pub fn new(duration: f64) -> Self {
        Self {
            duration,
            failing_starts: HashSet::new(),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            encoded: AtomicUsize::new(0),
            visuals: Mutex::new(Vec::new()),
        }
    }

    /// Fail every clip whose start (rounded down) is `start`.
    pub fn failing_at(mut self, start: u64) -> Self {
        self.failing_starts.insert(start);
        self
    }
}

#[async_trait]
impl MediaEncoder for FakeEncoder {
    async fn duration(&self, _source: &Path) -> MediaResult<f64> {
        Ok(self.duration)
    }

    async fn extract_audio(&self, _source: &Path, output: &Path) -> MediaResult<()> {
        tokio::fs::write(output, b"ID3 fake audio").await?;
        Ok(())
    }

    async fn encode_clip(&self, _source: &Path, output: &Path, spec: &ClipSpec) -> MediaResult<VideoEncoder> {
        self.visuals.lock().unwrap().push(spec.visual);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing_starts.contains(&(spec.start as u64)) {
            return Err(MediaError::ffmpeg_failed("encoder crashed", None, Some(1)));
        }
        tokio::fs::write(output, b"fake mp4").await?;
        self.encoded.fetch_add(1, Ordering::SeqCst);
        Ok(VideoEncoder::X264)
    }
}

pub struct FakeTranscriber {
    segments: Vec<ContentSegment>,
}

impl FakeTranscriber {
    pub fn new(segments: Vec<ContentSegment>) -> Arc<Self> {
        Arc::new(Self { segments })
    }
}

#[async_trait]
impl Transcriber for FakeTranscriber {
    async fn transcribe(&self, _audio: Vec<u8>) -> MlResult<Vec<ContentSegment>> {
        Ok(self.segments.clone())
    }
}

/// Replays scripted responses in order, then answers `[]`.
pub struct ScriptedReasoning {
    responses: Mutex<VecDeque<MlResult<String>>>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedReasoning {
    pub fn new(responses: Vec<MlResult<String>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl ReasoningClient for ScriptedReasoning {
    async fn complete(&self, prompt: &str) -> MlResult<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let next = self.responses.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok("[]".to_string()))
    }
}

/// One JSON candidate record.
pub fn clip_json(start: f64, end: f64, score: u8) -> String {
    format!(
        r#"{{"start_time": {}, "end_time": {}, "text": "t", "viral_score": {}, "topic": "x", "reason": "y"}}"#,
        start, end, score
    )
}

/// Five-second segments whose formatted lines are exactly `line_chars` long.
pub fn fixed_width_segments(count: usize, line_chars: usize) -> Vec<ContentSegment> {
    (0..count)
        .map(|i| {
            let start = i as f64 * 5.0;
            let prefix = ContentSegment::new(start, start + 5.0, "").to_line();
            let text_len = line_chars - prefix.chars().count() - 1;
            ContentSegment::new(start, start + 5.0, "w".repeat(text_len))
        })
        .collect()
}

/// Probe reporting a fixed duration.
pub struct FixedProbe(pub f64);

#[async_trait]
impl clipo_media::MetadataProbe for FixedProbe {
    async fn duration(&self, _locator: &str) -> MediaResult<f64> {
        Ok(self.0)
    }
}

/// Downloader that only succeeds with one client profile.
pub struct ProfileDownloader {
    pub working_profile: &'static str,
    pub attempts: AtomicUsize,
}

impl ProfileDownloader {
    pub fn new(working_profile: &'static str) -> Arc<Self> {
        Arc::new(Self {
            working_profile,
            attempts: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl clipo_media::Downloader for ProfileDownloader {
    async fn download(
        &self,
        _locator: &str,
        output: &Path,
        strategy: &clipo_media::AccessStrategy,
    ) -> MediaResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        match strategy {
            clipo_media::AccessStrategy::ClientProfile(p) if *p == self.working_profile => {
                tokio::fs::write(output, b"fake source").await?;
                Ok(())
            }
            other => Err(MediaError::download_failed(format!(
                "ERROR: [youtube] Sign in to confirm you're not a bot ({})",
                other
            ))),
        }
    }
}
