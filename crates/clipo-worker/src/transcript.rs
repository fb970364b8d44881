//! Transcript preparation.
//!
//! Extracts the audio track of the acquired source, sends it to the
//! transcription service and keeps a timestamped copy outside the job's
//! scratch directory.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use clipo_media::MediaEncoder;
use clipo_ml_client::Transcriber;
use clipo_models::{format_transcript, sort_segments, ContentSegment};

use crate::error::{WorkerError, WorkerResult};

const AUDIO_FILE: &str = "audio.mp3";

pub struct TranscriptBuilder {
    encoder: Arc<dyn MediaEncoder>,
    transcriber: Arc<dyn Transcriber>,
}

impl TranscriptBuilder {
    pub fn new(encoder: Arc<dyn MediaEncoder>, transcriber: Arc<dyn Transcriber>) -> Self {
        Self {
            encoder,
            transcriber,
        }
    }

    /// Timestamped segments of `source`, sorted by start time.
    ///
    /// Audio is staged in `workdir`; the formatted transcript is written to
    /// `transcript_path`.
    pub async fn build(
        &self,
        source: &Path,
        workdir: &Path,
        transcript_path: &Path,
    ) -> WorkerResult<Vec<ContentSegment>> {
        tokio::fs::create_dir_all(workdir).await?;

        let audio_path = workdir.join(AUDIO_FILE);
        self.encoder.extract_audio(source, &audio_path).await?;
        let audio = tokio::fs::read(&audio_path).await?;
        info!(bytes = audio.len(), "Audio extracted for transcription");

        let mut segments = self.transcriber.transcribe(audio).await?;
        segments.retain(|s| !s.text.trim().is_empty());
        if segments.is_empty() {
            return Err(WorkerError::transcription_failed("transcript is empty"));
        }
        sort_segments(&mut segments);

        persist_transcript(transcript_path, &format_transcript(&segments)).await;
        tokio::fs::remove_file(&audio_path).await.ok();

        Ok(segments)
    }
}

async fn persist_transcript(transcript_path: &Path, transcript: &str) {
    if let Some(parent) = transcript_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }
    if let Err(e) = tokio::fs::write(transcript_path, transcript).await {
        warn!(
            path = ?transcript_path,
            error = %e,
            "Failed to write transcript to disk"
        );
    }
}
