//! Scheduler admission results and status snapshots.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::job::JobId;
use crate::plan::PlanTier;

/// Result of submitting a job to the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// Started immediately in a free slot
    Dispatched { slot_id: usize },
    /// Waiting in the queue (1-based position)
    Queued { queue_position: usize },
}

impl SubmitOutcome {
    pub fn is_dispatched(&self) -> bool {
        matches!(self, SubmitOutcome::Dispatched { .. })
    }

    pub fn slot_id(&self) -> Option<usize> {
        match self {
            SubmitOutcome::Dispatched { slot_id } => Some(*slot_id),
            SubmitOutcome::Queued { .. } => None,
        }
    }

    pub fn queue_position(&self) -> Option<usize> {
        match self {
            SubmitOutcome::Queued { queue_position } => Some(*queue_position),
            SubmitOutcome::Dispatched { .. } => None,
        }
    }
}

/// A job currently occupying a slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ActiveTask {
    pub slot_id: usize,
    pub video_id: JobId,
    pub plan: PlanTier,
    pub elapsed_seconds: f64,
}

/// Lifetime counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SchedulerStatistics {
    pub total_submitted: u64,
    pub completed: u64,
    pub failed: u64,
}

/// Read-only snapshot of scheduler state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct QueueStatus {
    pub max_processes: usize,
    pub active_processes: usize,
    pub active_tasks: Vec<ActiveTask>,
    pub queued_tasks: usize,
    pub available_slots: usize,
    pub statistics: SchedulerStatistics,
}
