//! Execution seam between the scheduler and the pipeline.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use clipo_models::Job;

/// What a successful run produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub clips_generated: u32,
}

/// Runs one job to completion. An `Err` (or a panic) counts as a failure.
#[async_trait]
pub trait JobRunner: Send + Sync + 'static {
    async fn run(&self, job: Arc<Job>) -> Result<RunSummary, String>;
}
