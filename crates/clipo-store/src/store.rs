//! Store trait.

use async_trait::async_trait;

use clipo_models::{ArtifactRecord, VideoRecord};

use crate::error::StoreResult;

/// Persistence for video and clip records.
///
/// Ids are assigned by the store on create; the `id` field of the record
/// passed in is ignored.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn create_video(&self, video: VideoRecord) -> StoreResult<VideoRecord>;

    async fn get_video(&self, id: i64) -> StoreResult<Option<VideoRecord>>;

    /// Replace a stored video. Fails with `NotFound` if it does not exist.
    async fn update_video(&self, video: &VideoRecord) -> StoreResult<()>;

    /// Delete a video and its clips. Returns whether the video existed.
    async fn delete_video(&self, id: i64) -> StoreResult<bool>;

    async fn create_artifact(&self, artifact: ArtifactRecord) -> StoreResult<ArtifactRecord>;

    async fn get_artifact(&self, id: i64) -> StoreResult<Option<ArtifactRecord>>;

    /// Clips of a video, ordered by id.
    async fn list_artifacts(&self, video_id: i64) -> StoreResult<Vec<ArtifactRecord>>;

    async fn delete_artifact(&self, id: i64) -> StoreResult<bool>;
}
