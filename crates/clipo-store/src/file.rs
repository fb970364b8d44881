//! JSON file record store.
//!
//! Keeps `videos.json` and `clips.json` (arrays of records) under one
//! directory. Every mutation rewrites the affected file through a temp
//! file and rename, so a crash leaves either the old or the new content.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use metrics::counter;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

use clipo_models::{ArtifactRecord, VideoRecord};

use crate::error::StoreResult;
use crate::memory::Tables;
use crate::store::RecordStore;

const VIDEOS_FILE: &str = "videos.json";
const CLIPS_FILE: &str = "clips.json";

/// Record store persisted as JSON files.
pub struct JsonFileStore {
    dir: PathBuf,
    tables: Mutex<Tables>,
}

impl JsonFileStore {
    /// Open (or create) a store rooted at `dir`.
    pub async fn open(dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;

        let videos: Vec<VideoRecord> = read_records(&dir.join(VIDEOS_FILE)).await?;
        let artifacts: Vec<ArtifactRecord> = read_records(&dir.join(CLIPS_FILE)).await?;
        info!(
            dir = %dir.display(),
            videos = videos.len(),
            clips = artifacts.len(),
            "Opened record store"
        );

        Ok(Self {
            dir,
            tables: Mutex::new(Tables::from_records(videos, artifacts)),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn save_videos(&self, tables: &Tables) -> StoreResult<()> {
        let records: Vec<&VideoRecord> = tables.videos.values().collect();
        write_records(&self.dir.join(VIDEOS_FILE), &records).await?;
        counter!("clipo_store_writes_total", "table" => "videos").increment(1);
        Ok(())
    }

    async fn save_artifacts(&self, tables: &Tables) -> StoreResult<()> {
        let records: Vec<&ArtifactRecord> = tables.artifacts.values().collect();
        write_records(&self.dir.join(CLIPS_FILE), &records).await?;
        counter!("clipo_store_writes_total", "table" => "clips").increment(1);
        Ok(())
    }
}

async fn read_records<T: DeserializeOwned>(path: &Path) -> StoreResult<Vec<T>> {
    match tokio::fs::read(path).await {
        Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Vec::new()),
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

async fn write_records<T: Serialize>(path: &Path, records: &[T]) -> StoreResult<()> {
    let bytes = serde_json::to_vec_pretty(records)?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, &bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    debug!(path = %path.display(), bytes = bytes.len(), "Wrote records");
    Ok(())
}

#[async_trait]
impl RecordStore for JsonFileStore {
    async fn create_video(&self, video: VideoRecord) -> StoreResult<VideoRecord> {
        let mut tables = self.tables.lock().await;
        let created = tables.insert_video(video);
        self.save_videos(&tables).await?;
        Ok(created)
    }

    async fn get_video(&self, id: i64) -> StoreResult<Option<VideoRecord>> {
        Ok(self.tables.lock().await.videos.get(&id).cloned())
    }

    async fn update_video(&self, video: &VideoRecord) -> StoreResult<()> {
        let mut tables = self.tables.lock().await;
        tables.replace_video(video)?;
        self.save_videos(&tables).await
    }

    async fn delete_video(&self, id: i64) -> StoreResult<bool> {
        let mut tables = self.tables.lock().await;
        let had_clips = tables.artifacts.values().any(|a| a.video_id == id);
        if !tables.remove_video(id) {
            return Ok(false);
        }
        self.save_videos(&tables).await?;
        if had_clips {
            self.save_artifacts(&tables).await?;
        }
        Ok(true)
    }

    async fn create_artifact(&self, artifact: ArtifactRecord) -> StoreResult<ArtifactRecord> {
        let mut tables = self.tables.lock().await;
        let created = tables.insert_artifact(artifact)?;
        self.save_artifacts(&tables).await?;
        Ok(created)
    }

    async fn get_artifact(&self, id: i64) -> StoreResult<Option<ArtifactRecord>> {
        Ok(self.tables.lock().await.artifacts.get(&id).cloned())
    }

    async fn list_artifacts(&self, video_id: i64) -> StoreResult<Vec<ArtifactRecord>> {
        Ok(self.tables.lock().await.artifacts_of(video_id))
    }

    async fn delete_artifact(&self, id: i64) -> StoreResult<bool> {
        let mut tables = self.tables.lock().await;
        if tables.artifacts.remove(&id).is_none() {
            return Ok(false);
        }
        self.save_artifacts(&tables).await?;
        Ok(true)
    }
}
