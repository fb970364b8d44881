//! In-memory record store.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use clipo_models::{ArtifactRecord, VideoRecord};

use crate::error::{StoreError, StoreResult};
use crate::store::RecordStore;

#[derive(Debug, Default)]
pub(crate) struct Tables {
    pub videos: BTreeMap<i64, VideoRecord>,
    pub artifacts: BTreeMap<i64, ArtifactRecord>,
}

impl Tables {
    pub fn from_records(videos: Vec<VideoRecord>, artifacts: Vec<ArtifactRecord>) -> Self {
        Self {
            videos: videos.into_iter().map(|v| (v.id, v)).collect(),
            artifacts: artifacts.into_iter().map(|a| (a.id, a)).collect(),
        }
    }

    fn next_video_id(&self) -> i64 {
        self.videos.keys().next_back().copied().unwrap_or(0) + 1
    }

    fn next_artifact_id(&self) -> i64 {
        self.artifacts.keys().next_back().copied().unwrap_or(0) + 1
    }

    pub fn insert_video(&mut self, mut video: VideoRecord) -> VideoRecord {
        video.id = self.next_video_id();
        self.videos.insert(video.id, video.clone());
        video
    }

    pub fn replace_video(&mut self, video: &VideoRecord) -> StoreResult<()> {
        match self.videos.get_mut(&video.id) {
            Some(slot) => {
                *slot = video.clone();
                Ok(())
            }
            None => Err(StoreError::video_not_found(video.id)),
        }
    }

    pub fn remove_video(&mut self, id: i64) -> bool {
        let existed = self.videos.remove(&id).is_some();
        if existed {
            self.artifacts.retain(|_, a| a.video_id != id);
        }
        existed
    }

    pub fn insert_artifact(&mut self, mut artifact: ArtifactRecord) -> StoreResult<ArtifactRecord> {
        if !self.videos.contains_key(&artifact.video_id) {
            return Err(StoreError::video_not_found(artifact.video_id));
        }
        artifact.id = self.next_artifact_id();
        self.artifacts.insert(artifact.id, artifact.clone());
        Ok(artifact)
    }

    pub fn artifacts_of(&self, video_id: i64) -> Vec<ArtifactRecord> {
        self.artifacts
            .values()
            .filter(|a| a.video_id == video_id)
            .cloned()
            .collect()
    }
}

/// Records held in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn create_video(&self, video: VideoRecord) -> StoreResult<VideoRecord> {
        Ok(self.tables.write().await.insert_video(video))
    }

    async fn get_video(&self, id: i64) -> StoreResult<Option<VideoRecord>> {
        Ok(self.tables.read().await.videos.get(&id).cloned())
    }

    async fn update_video(&self, video: &VideoRecord) -> StoreResult<()> {
        self.tables.write().await.replace_video(video)
    }

    async fn delete_video(&self, id: i64) -> StoreResult<bool> {
        Ok(self.tables.write().await.remove_video(id))
    }

    async fn create_artifact(&self, artifact: ArtifactRecord) -> StoreResult<ArtifactRecord> {
        self.tables.write().await.insert_artifact(artifact)
    }

    async fn get_artifact(&self, id: i64) -> StoreResult<Option<ArtifactRecord>> {
        Ok(self.tables.read().await.artifacts.get(&id).cloned())
    }

    async fn list_artifacts(&self, video_id: i64) -> StoreResult<Vec<ArtifactRecord>> {
        Ok(self.tables.read().await.artifacts_of(video_id))
    }

    async fn delete_artifact(&self, id: i64) -> StoreResult<bool> {
        Ok(self.tables.write().await.artifacts.remove(&id).is_some())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use clipo_models::{CandidateWindow, PlanTier, QualityProfile};

    pub fn video() -> VideoRecord {
        VideoRecord::new(
            "https://www.youtube.com/watch?v=abc",
            PlanTier::Free,
            QualityProfile::default(),
            12,
        )
    }

    pub fn artifact(video_id: i64, start: f64) -> ArtifactRecord {
        let window = CandidateWindow::new(start, start + 30.0, 70);
        ArtifactRecord::from_window(video_id, &window, "clips/x.mp4", QualityProfile::default())
    }

    #[tokio::test]
    async fn test_ids_are_sequential() {
        let store = MemoryStore::new();
        let a = store.create_video(video()).await.unwrap();
        let b = store.create_video(video()).await.unwrap();
        assert_eq!((a.id, b.id), (1, 2));
    }

    #[tokio::test]
    async fn test_update_missing_video_fails() {
        let store = MemoryStore::new();
        let mut v = video();
        v.id = 42;
        assert!(store.update_video(&v).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_delete_video_cascades() {
        let store = MemoryStore::new();
        let v = store.create_video(video()).await.unwrap();
        let other = store.create_video(video()).await.unwrap();
        store.create_artifact(artifact(v.id, 0.0)).await.unwrap();
        store.create_artifact(artifact(v.id, 40.0)).await.unwrap();
        store.create_artifact(artifact(other.id, 0.0)).await.unwrap();

        assert_eq!(store.list_artifacts(v.id).await.unwrap().len(), 2);
        assert!(store.delete_video(v.id).await.unwrap());
        assert!(store.list_artifacts(v.id).await.unwrap().is_empty());
        assert_eq!(store.list_artifacts(other.id).await.unwrap().len(), 1);
        assert!(!store.delete_video(v.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_artifact_requires_video() {
        let store = MemoryStore::new();
        assert!(store.create_artifact(artifact(9, 0.0)).await.is_err());
    }
}
