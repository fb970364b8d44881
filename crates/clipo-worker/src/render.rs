//! Parallel vertical render stage.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use metrics::counter;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use clipo_media::{ClipSpec, MediaEncoder, VisualFilter};
use clipo_models::{ArtifactRecord, QualityProfile, SelectedWindow};

use crate::error::{WorkerError, WorkerResult};

/// Inputs shared by every window of one job.
#[derive(Debug, Clone)]
pub struct RenderJob<'a> {
    pub video_id: i64,
    pub source: &'a Path,
    pub output_dir: &'a Path,
    pub quality: QualityProfile,
    pub visual: VisualFilter,
    pub watermark: bool,
    /// Windows ending past this point are skipped.
    pub source_duration: Option<f64>,
}

/// Outcome of rendering a selection.
#[derive(Debug, Default)]
pub struct RenderReport {
    /// Rendered clips, in selection order
    pub artifacts: Vec<ArtifactRecord>,
    /// Window index and reason for every clip that did not render
    pub failed: Vec<(usize, String)>,
}

impl RenderReport {
    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

/// Output file name of the `index`-th (0-based) clip.
pub fn clip_filename(video_id: i64, index: usize, viral_score: u8, timestamp: i64) -> String {
    format!(
        "clip_{}_{}_score{}_{}.mp4",
        video_id,
        index + 1,
        viral_score,
        timestamp
    )
}

/// Renders selected windows with a bounded number of concurrent encodes.
pub struct RenderStage {
    encoder: Arc<dyn MediaEncoder>,
    permits: Arc<Semaphore>,
}

impl RenderStage {
    pub fn new(encoder: Arc<dyn MediaEncoder>, workers: usize) -> Self {
        Self {
            encoder,
            permits: Arc::new(Semaphore::new(workers.max(1))),
        }
    }

    /// Render one window into `job.output_dir`.
    pub async fn render(&self, job: &RenderJob<'_>, window: &SelectedWindow) -> WorkerResult<ArtifactRecord> {
        let index = window.index;
        let (start, end) = (window.window.start_time, window.window.end_time);

        if start < 0.0 || job.source_duration.is_some_and(|d| end > d) {
            return Err(WorkerError::render_failed(
                index,
                format!("window {:.2}-{:.2}s lies outside the source", start, end),
            ));
        }

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| WorkerError::render_failed(index, "render pool closed"))?;

        let filename = clip_filename(
            job.video_id,
            index,
            window.window.viral_score,
            Utc::now().timestamp(),
        );
        let output_path: PathBuf = job.output_dir.join(&filename);
        let spec = ClipSpec {
            start,
            end,
            quality: job.quality,
            visual: job.visual,
            watermark: job.watermark,
        };

        info!(
            clip_index = index + 1,
            start,
            end,
            score = window.window.viral_score,
            filename = %filename,
            "Rendering clip"
        );

        let encoder = self
            .encoder
            .encode_clip(job.source, &output_path, &spec)
            .await
            .map_err(|e| WorkerError::render_failed(index, e.to_string()))?;

        counter!("clipo_renders_total", "outcome" => "success", "encoder" => encoder.codec_name())
            .increment(1);

        Ok(ArtifactRecord::from_window(
            job.video_id,
            &window.window,
            output_path.to_string_lossy(),
            job.quality,
        ))
    }

    /// Render every window; failures are isolated and reported per index.
    pub async fn render_all(&self, job: &RenderJob<'_>, windows: &[SelectedWindow]) -> WorkerResult<RenderReport> {
        tokio::fs::create_dir_all(job.output_dir).await?;

        let results = join_all(windows.iter().map(|w| self.render(job, w))).await;

        let mut report = RenderReport::default();
        for (window, result) in windows.iter().zip(results) {
            match result {
                Ok(artifact) => report.artifacts.push(artifact),
                Err(e) => {
                    counter!("clipo_renders_total", "outcome" => "failure", "encoder" => "none")
                        .increment(1);
                    warn!(clip_index = window.index + 1, "{}", e);
                    report.failed.push((window.index, e.to_string()));
                }
            }
        }

        info!(
            rendered = report.artifacts.len(),
            failed = report.failed.len(),
            "Render stage complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeEncoder;
    use clipo_models::CandidateWindow;
    use std::sync::atomic::Ordering;
    use tempfile::TempDir;

    fn windows(starts: &[f64]) -> Vec<SelectedWindow> {
        starts
            .iter()
            .enumerate()
            .map(|(i, s)| SelectedWindow::new(i, CandidateWindow::new(*s, s + 20.0, 90 - i as u8)))
            .collect()
    }

    fn job<'a>(source: &'a Path, out: &'a Path) -> RenderJob<'a> {
        RenderJob {
            video_id: 7,
            source,
            output_dir: out,
            quality: QualityProfile::default(),
            visual: VisualFilter::None,
            watermark: false,
            source_duration: Some(300.0),
        }
    }

    #[test]
    fn test_clip_filename() {
        assert_eq!(clip_filename(7, 0, 88, 1700000000), "clip_7_1_score88_1700000000.mp4");
    }

    #[tokio::test]
    async fn test_failure_is_isolated_and_order_kept() {
        let dir = TempDir::new().unwrap();
        let encoder = Arc::new(FakeEncoder::new(300.0).failing_at(50));
        let stage = RenderStage::new(encoder.clone(), 2);
        let source = dir.path().join("source.mp4");
        let out = dir.path().join("clips");

        let report = stage
            .render_all(&job(&source, &out), &windows(&[0.0, 50.0, 100.0, 150.0, 200.0]))
            .await
            .unwrap();

        assert_eq!(report.artifacts.len(), 4);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, 1);
        let starts: Vec<f64> = report.artifacts.iter().map(|a| a.start_time).collect();
        assert_eq!(starts, vec![0.0, 100.0, 150.0, 200.0]);
        assert!(report.artifacts.iter().all(|a| Path::new(&a.output_path).exists()));
        assert!(encoder.max_in_flight.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_window_past_source_end_is_skipped() {
        let dir = TempDir::new().unwrap();
        let encoder = Arc::new(FakeEncoder::new(300.0));
        let stage = RenderStage::new(encoder.clone(), 2);
        let source = dir.path().join("source.mp4");

        let report = stage
            .render_all(&job(&source, dir.path()), &windows(&[10.0, 290.0]))
            .await
            .unwrap();

        assert_eq!(report.artifacts.len(), 1);
        assert_eq!(report.failed[0].0, 1);
        assert_eq!(encoder.encoded.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_semaphore_bounds_concurrency() {
        let dir = TempDir::new().unwrap();
        let encoder = Arc::new(FakeEncoder::new(1000.0));
        let stage = RenderStage::new(encoder.clone(), 3);
        let source = dir.path().join("source.mp4");
        let starts: Vec<f64> = (0..10).map(|i| f64::from(i) * 30.0).collect();

        let report = stage
            .render_all(&job(&source, dir.path()), &windows(&starts))
            .await
            .unwrap();

        assert_eq!(report.artifacts.len(), 10);
        let peak = encoder.max_in_flight.load(Ordering::SeqCst);
        assert!(peak <= 3 && peak >= 1);
    }
}
