//! Video submission and lookup handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

use clipo_models::{
    clamp_clip_count, ArtifactRecord, Job, PlanTier, QualityProfile, Resolution, SourceLocator,
    VideoRecord, VisualFilter, DEFAULT_CLIP_COUNT,
};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Body of `POST /api/videos`.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitVideoRequest {
    #[validate(length(min = 1, max = 2048), url)]
    pub url: String,

    /// Requested clip count; clamped into the supported range
    #[serde(default)]
    pub clip_count: Option<u32>,

    #[serde(default)]
    pub plan: Option<String>,

    #[serde(default)]
    pub resolution: Option<String>,

    #[validate(range(min = 1, max = 120))]
    #[serde(default)]
    pub fps: Option<u32>,

    /// Look applied to every clip: none, vivid or grayscale
    #[serde(default)]
    pub filter: Option<String>,
}

/// Admission result for a submitted video.
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitVideoResponse {
    pub video_id: i64,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot_id: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_position: Option<usize>,
}

/// A video record with its rendered clips.
#[derive(Debug, Serialize, Deserialize)]
pub struct VideoDetailResponse {
    #[serde(flatten)]
    pub video: VideoRecord,
    pub clips: Vec<ArtifactRecord>,
}

/// POST /api/videos
///
/// Creates the video record, then hands the job to the scheduler, which
/// either starts it in a free slot or queues it.
pub async fn submit_video(
    State(state): State<AppState>,
    Json(request): Json<SubmitVideoRequest>,
) -> ApiResult<(StatusCode, Json<SubmitVideoResponse>)> {
    request.validate()?;

    // Reject bad locators before a record exists for them
    SourceLocator::parse(&request.url)?;

    let plan = request
        .plan
        .as_deref()
        .map(PlanTier::from_str)
        .unwrap_or_default();
    let resolution = request
        .resolution
        .as_deref()
        .map(Resolution::parse)
        .transpose()?;
    let quality = QualityProfile::for_plan(plan, resolution, request.fps);
    let visual = request
        .filter
        .as_deref()
        .map(VisualFilter::parse)
        .transpose()?
        .unwrap_or_default();
    let clip_count = clamp_clip_count(request.clip_count.unwrap_or(DEFAULT_CLIP_COUNT));

    let video = state
        .store
        .create_video(VideoRecord::new(request.url.trim(), plan, quality, clip_count))
        .await?;

    let job = Job::new(video.id, &video.source_url, quality, Some(clip_count), plan)?
        .with_visual(visual);

    let outcome = match state.scheduler.submit(job).await {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!(video_id = video.id, error = %e, "Scheduler rejected job");
            if let Err(cleanup) = state.store.delete_video(video.id).await {
                warn!(video_id = video.id, error = %cleanup, "Failed to remove rejected video record");
            }
            return Err(e.into());
        }
    };

    info!(
        video_id = video.id,
        plan = %plan,
        resolution = %quality.resolution,
        clip_count,
        visual = ?visual,
        dispatched = outcome.is_dispatched(),
        "Video submitted"
    );

    let status = if outcome.is_dispatched() { "dispatched" } else { "queued" };
    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitVideoResponse {
            video_id: video.id,
            status: status.to_string(),
            slot_id: outcome.slot_id(),
            queue_position: outcome.queue_position(),
        }),
    ))
}

/// GET /api/videos/:video_id
pub async fn get_video(
    State(state): State<AppState>,
    Path(video_id): Path<i64>,
) -> ApiResult<Json<VideoDetailResponse>> {
    let video = state
        .store
        .get_video(video_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("video {}", video_id)))?;

    let clips = state.store.list_artifacts(video_id).await?;

    Ok(Json(VideoDetailResponse { video, clips }))
}
