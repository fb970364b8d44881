//! Per-job orchestration.
//!
//! acquire -> transcribe -> select -> render, with the video record moved
//! through `processing` to `finished` or `error`.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{warn, Instrument};

use clipo_media::{Acquirer, MediaEncoder};
use clipo_ml_client::{ReasoningClient, Transcriber};
use clipo_models::Job;
use clipo_queue::{JobRunner, RunSummary};
use clipo_store::{RecordStore, StoreError};

use crate::analysis::SelectionEngine;
use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::render::{RenderJob, RenderStage};
use crate::transcript::TranscriptBuilder;

const SOURCE_FILE: &str = "source.mp4";

/// External capabilities the pipeline is built from.
pub struct PipelineDeps {
    pub store: Arc<dyn RecordStore>,
    pub acquirer: Acquirer,
    pub encoder: Arc<dyn MediaEncoder>,
    pub transcriber: Arc<dyn Transcriber>,
    pub reasoning: Arc<dyn ReasoningClient>,
}

/// Full clip pipeline for one job.
pub struct ClipPipeline {
    config: WorkerConfig,
    store: Arc<dyn RecordStore>,
    acquirer: Acquirer,
    encoder: Arc<dyn MediaEncoder>,
    transcripts: TranscriptBuilder,
    selection: SelectionEngine,
    renderer: RenderStage,
}

impl ClipPipeline {
    pub fn new(config: WorkerConfig, deps: PipelineDeps) -> Self {
        let transcripts = TranscriptBuilder::new(deps.encoder.clone(), deps.transcriber);
        let selection = SelectionEngine::from_config(deps.reasoning, &config);
        let renderer = RenderStage::new(deps.encoder.clone(), config.render_workers);
        Self {
            config,
            store: deps.store,
            acquirer: deps.acquirer,
            encoder: deps.encoder,
            transcripts,
            selection,
            renderer,
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Run `job` and record the outcome on its video record.
    pub async fn process(&self, job: &Job) -> WorkerResult<RunSummary> {
        let logger = JobLogger::new(job.id, "pipeline");
        let video_id = job.id.get();

        let mut video = self
            .store
            .get_video(video_id)
            .await?
            .ok_or_else(|| WorkerError::Store(StoreError::video_not_found(video_id)))?;
        video.mark_processing();
        self.store.update_video(&video).await?;
        logger.log_start(job.source.as_str());

        let workdir = self.config.job_dir(video_id);
        let result = self.execute(job, &workdir, &logger).await;

        match &result {
            Ok(clips) => {
                video.mark_finished(*clips);
                logger.log_completion(&format!("{} clips generated", clips));
            }
            Err(e) => {
                video.mark_error(e.to_string());
                logger.log_error(&e.to_string());
            }
        }
        if let Err(e) = self.store.update_video(&video).await {
            logger.log_warning(&format!("failed to record final status: {}", e));
        }

        if let Err(e) = tokio::fs::remove_dir_all(&workdir).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %workdir.display(), "Failed to remove job directory: {}", e);
            }
        }

        result.map(|clips_generated| RunSummary { clips_generated })
    }

    async fn execute(&self, job: &Job, workdir: &Path, logger: &JobLogger) -> WorkerResult<u32> {
        tokio::fs::create_dir_all(workdir).await?;

        let acquire_log = logger.stage("acquire");
        let source = self
            .acquirer
            .acquire(job.source.as_str(), &workdir.join(SOURCE_FILE))
            .await?;
        acquire_log.log_progress(&format!("source ready at {}", source.display()));

        let source_duration = match self.encoder.duration(&source).await {
            Ok(d) => Some(d),
            Err(e) => {
                acquire_log.log_warning(&format!("could not probe source duration: {}", e));
                None
            }
        };

        let transcript_log = logger.stage("transcribe");
        let transcript_path = self.config.transcript_path(job.id.get());
        let segments = self
            .transcripts
            .build(&source, workdir, &transcript_path)
            .await?;
        transcript_log.log_progress(&format!("{} transcript segments", segments.len()));

        let windows = self
            .selection
            .select_highlights(&segments, job.clip_count as usize)
            .instrument(logger.stage("analysis").span())
            .await;
        if windows.is_empty() {
            return Err(WorkerError::NoValidClips);
        }
        logger
            .stage("analysis")
            .log_progress(&format!("{} windows selected", windows.len()));

        let render_job = RenderJob {
            video_id: job.id.get(),
            source: &source,
            output_dir: &self.config.clips_dir,
            quality: job.quality,
            visual: job.visual,
            watermark: job.plan.requires_watermark(),
            source_duration,
        };
        let report = self
            .renderer
            .render_all(&render_job, &windows)
            .instrument(logger.stage("render").span())
            .await?;

        if report.is_empty() {
            return Err(WorkerError::job_failed(format!(
                "all {} clip renders failed",
                report.failed.len()
            )));
        }

        let mut stored = 0u32;
        for artifact in report.artifacts {
            self.store.create_artifact(artifact).await?;
            stored += 1;
        }
        Ok(stored)
    }
}

#[async_trait]
impl JobRunner for ClipPipeline {
    async fn run(&self, job: Arc<Job>) -> Result<RunSummary, String> {
        let span = JobLogger::new(job.id, "pipeline").span();
        self.process(&job)
            .instrument(span)
            .await
            .map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        clip_json, fixed_width_segments, FakeEncoder, FakeTranscriber, FixedProbe, ProfileDownloader,
        ScriptedReasoning,
    };
    use clipo_media::{AcquireConfig, MediaError};
    use clipo_models::{PlanTier, QualityProfile, VideoRecord, VideoStatus, VisualFilter};
    use clipo_store::MemoryStore;
    use std::sync::atomic::Ordering;
    use tempfile::TempDir;

    struct Harness {
        _dir: TempDir,
        config: WorkerConfig,
        store: Arc<MemoryStore>,
    }

    impl Harness {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let config = WorkerConfig {
                work_dir: dir.path().join("temp"),
                clips_dir: dir.path().join("clips"),
                ..WorkerConfig::default()
            };
            Self {
                _dir: dir,
                config,
                store: Arc::new(MemoryStore::new()),
            }
        }

        fn acquire_config() -> AcquireConfig {
            AcquireConfig {
                cookies_path: None,
                part_retry_delays: Vec::new(),
                ..AcquireConfig::default()
            }
        }

        async fn job(&self, clip_count: u32) -> Job {
            let video = self
                .store
                .create_video(VideoRecord::new(
                    "https://www.youtube.com/watch?v=abc",
                    PlanTier::Free,
                    QualityProfile::default(),
                    clip_count,
                ))
                .await
                .unwrap();
            Job::new(
                video.id,
                &video.source_url,
                video.quality,
                Some(clip_count),
                video.plan,
            )
            .unwrap()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_to_end_with_one_failed_render() {
        let h = Harness::new();
        let downloader = ProfileDownloader::new("ios");
        let acquirer = Acquirer::new(
            Harness::acquire_config(),
            Arc::new(FixedProbe(540.0)),
            downloader.clone(),
        );
        // 45,000 characters of transcript over 2,250 seconds of speech
        let transcriber = FakeTranscriber::new(fixed_width_segments(450, 100));
        let reasoning = ScriptedReasoning::new(vec![
            Ok(format!("[{}, {}]", clip_json(10.0, 40.0, 80), clip_json(60.0, 90.0, 75))),
            Ok("[]".into()),
            Ok("[]".into()),
            Ok(format!("```json\n[{}]\n```", clip_json(200.0, 230.0, 95))),
        ]);
        let encoder = Arc::new(FakeEncoder::new(540.0).failing_at(60));

        let pipeline = ClipPipeline::new(
            h.config.clone(),
            PipelineDeps {
                store: h.store.clone(),
                acquirer,
                encoder: encoder.clone(),
                transcriber,
                reasoning: reasoning.clone(),
            },
        );
        let job = h.job(12).await.with_visual(VisualFilter::Vivid);

        let summary = pipeline.run(Arc::new(job.clone())).await.unwrap();

        // android fails, ios succeeds
        assert_eq!(downloader.attempts.load(Ordering::SeqCst), 2);
        // 2 chunks x 3 attempts
        assert_eq!(reasoning.calls(), 6);
        assert_eq!(summary.clips_generated, 2);
        let visuals = encoder.visuals.lock().unwrap().clone();
        assert_eq!(visuals, vec![VisualFilter::Vivid; 3]);

        let video = h.store.get_video(job.id.get()).await.unwrap().unwrap();
        assert_eq!(video.status, VideoStatus::Finished);
        assert_eq!(video.clips_generated, 2);

        let clips = h.store.list_artifacts(job.id.get()).await.unwrap();
        assert_eq!(clips.len(), 2);
        assert_eq!(clips[0].viral_score, 95);
        assert!(clips[0].output_path.contains("clip_1_1_score95_"));
        assert!(!h.config.job_dir(job.id.get()).exists());
        assert!(h.config.transcript_path(job.id.get()).exists());
    }

    #[tokio::test(start_paused = true)]
    async fn test_too_long_source_marks_error() {
        let h = Harness::new();
        let downloader = ProfileDownloader::new("ios");
        let acquirer = Acquirer::new(
            Harness::acquire_config(),
            Arc::new(FixedProbe(601.0)),
            downloader.clone(),
        );
        let pipeline = ClipPipeline::new(
            h.config.clone(),
            PipelineDeps {
                store: h.store.clone(),
                acquirer,
                encoder: Arc::new(FakeEncoder::new(601.0)),
                transcriber: FakeTranscriber::new(fixed_width_segments(10, 80)),
                reasoning: ScriptedReasoning::new(Vec::new()),
            },
        );
        let job = h.job(5).await;

        let err = pipeline.process(&job).await.unwrap_err();
        assert!(matches!(err, WorkerError::Media(MediaError::SourceTooLong { .. })));
        assert_eq!(downloader.attempts.load(Ordering::SeqCst), 0);

        let video = h.store.get_video(job.id.get()).await.unwrap().unwrap();
        assert_eq!(video.status, VideoStatus::Error);
        assert!(video.error_message.unwrap().contains("601"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_valid_clips_marks_error() {
        let h = Harness::new();
        let acquirer = Acquirer::new(
            Harness::acquire_config(),
            Arc::new(FixedProbe(120.0)),
            ProfileDownloader::new("android"),
        );
        let pipeline = ClipPipeline::new(
            h.config.clone(),
            PipelineDeps {
                store: h.store.clone(),
                acquirer,
                encoder: Arc::new(FakeEncoder::new(120.0)),
                transcriber: FakeTranscriber::new(fixed_width_segments(24, 80)),
                reasoning: ScriptedReasoning::new(vec![Ok("no highlights here".into())]),
            },
        );
        let job = h.job(3).await;

        let err = pipeline.run(Arc::new(job.clone())).await.unwrap_err();
        assert_eq!(err, "No valid clips found");
        let video = h.store.get_video(job.id.get()).await.unwrap().unwrap();
        assert_eq!(video.status, VideoStatus::Error);
        assert_eq!(video.error_message.as_deref(), Some("No valid clips found"));
    }
}
