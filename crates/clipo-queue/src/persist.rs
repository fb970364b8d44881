//! Durable queue mirror.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use clipo_models::Job;

use crate::error::{QueueError, QueueResult};

/// Lifecycle of a persisted entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryState {
    #[default]
    Queued,
    /// Being moved into a slot; seen on load only after a crash mid-dispatch.
    Dispatching,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEntry {
    #[serde(default)]
    pub state: EntryState,
    pub job: Job,
}

/// JSON array of queue entries, rewritten wholesale on every change.
#[derive(Debug, Clone)]
pub struct QueueFile {
    path: PathBuf,
}

impl QueueFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the queue. A missing or blank file is an empty queue.
    ///
    /// Entries caught mid-dispatch are moved to the head and reset to queued.
    pub async fn load(&self) -> QueueResult<Vec<Job>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        let entries: Vec<QueueEntry> = serde_json::from_slice(&bytes).map_err(|e| {
            QueueError::persistence(format!("{}: {}", self.path.display(), e))
        })?;

        let (recovered, queued): (Vec<_>, Vec<_>) = entries
            .into_iter()
            .partition(|e| e.state == EntryState::Dispatching);

        for entry in &recovered {
            warn!(
                job_id = %entry.job.id,
                "Re-queueing job interrupted during dispatch"
            );
        }

        Ok(recovered
            .into_iter()
            .chain(queued)
            .map(|e| e.job)
            .collect())
    }

    /// Replace the file contents with `entries` (temp file + rename).
    pub async fn save<'a, I>(&self, entries: I) -> QueueResult<()>
    where
        I: IntoIterator<Item = (EntryState, &'a Job)>,
    {
        let entries: Vec<SavedEntry<'a>> = entries
            .into_iter()
            .map(|(state, job)| SavedEntry { state, job })
            .collect();
        let bytes = serde_json::to_vec_pretty(&entries)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        debug!(path = %self.path.display(), entries = entries.len(), "Persisted queue");
        Ok(())
    }

    /// Persist a plain FIFO queue with every entry in the queued state.
    pub async fn save_queued<'a, I>(&self, jobs: I) -> QueueResult<()>
    where
        I: IntoIterator<Item = &'a Job>,
    {
        self.save(jobs.into_iter().map(|job| (EntryState::Queued, job)))
            .await
    }
}

#[derive(Serialize)]
struct SavedEntry<'a> {
    state: EntryState,
    job: &'a Job,
}

/// Job ids in queue order, for logs.
pub(crate) fn job_ids(queue: &VecDeque<std::sync::Arc<Job>>) -> Vec<i64> {
    queue.iter().map(|j| j.id.get()).collect()
}
