//! Slot scheduler with a durable FIFO queue.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, gauge};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use clipo_models::{ActiveTask, Job, PlanTier, QueueStatus, SchedulerStatistics, SubmitOutcome};

use crate::config::SchedulerConfig;
use crate::error::QueueResult;
use crate::persist::{job_ids, EntryState, QueueFile};
use crate::runner::JobRunner;

#[derive(Debug, Clone)]
struct SlotTask {
    job_id: clipo_models::JobId,
    plan: PlanTier,
    started_at: Instant,
}

#[derive(Debug, Default)]
struct SchedulerState {
    slots: Vec<Option<SlotTask>>,
    queue: VecDeque<Arc<Job>>,
    stats: SchedulerStatistics,
}

impl SchedulerState {
    fn free_slot(&self) -> Option<usize> {
        self.slots.iter().position(Option::is_none)
    }

    fn active(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    fn record_gauges(&self) {
        gauge!("clipo_queue_depth").set(self.queue.len() as f64);
        gauge!("clipo_active_slots").set(self.active() as f64);
    }
}

/// Fixed pool of execution slots in front of a FIFO queue.
///
/// Slots, queue and statistics live behind one lock. The queue file is
/// rewritten while that lock is held so file order always matches memory.
pub struct Scheduler {
    config: SchedulerConfig,
    runner: Arc<dyn JobRunner>,
    queue_file: QueueFile,
    state: Mutex<SchedulerState>,
}

impl Scheduler {
    /// Build a scheduler, restoring any jobs left in the queue file.
    pub async fn new(config: SchedulerConfig, runner: Arc<dyn JobRunner>) -> QueueResult<Arc<Self>> {
        let queue_file = QueueFile::new(&config.queue_file);
        let restored: VecDeque<Arc<Job>> = queue_file.load().await?.into_iter().map(Arc::new).collect();

        // Normalise interrupted dispatches back to plain queued entries.
        queue_file.save_queued(restored.iter().map(Arc::as_ref)).await?;

        if !restored.is_empty() {
            info!(
                queued = restored.len(),
                jobs = ?job_ids(&restored),
                "Restored persisted queue"
            );
        }

        let state = SchedulerState {
            slots: vec![None; config.max_processes],
            queue: restored,
            stats: SchedulerStatistics::default(),
        };
        state.record_gauges();

        info!(
            max_processes = config.max_processes,
            queue_file = %config.queue_file.display(),
            "Scheduler ready"
        );

        Ok(Arc::new(Self {
            config,
            runner,
            queue_file,
            state: Mutex::new(state),
        }))
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Submit a job: run it in a free slot, or append it to the queue.
    pub async fn submit(self: &Arc<Self>, job: Job) -> QueueResult<SubmitOutcome> {
        job.validate()?;
        let job = Arc::new(job);

        let mut state = self.state.lock().await;
        state.stats.total_submitted += 1;
        counter!("clipo_jobs_submitted_total").increment(1);

        let outcome = match state.free_slot() {
            Some(slot_id) => {
                self.dispatch(&mut state, slot_id, job.clone());
                SubmitOutcome::Dispatched { slot_id }
            }
            None => {
                state.queue.push_back(job.clone());
                self.persist(&state).await;
                SubmitOutcome::Queued {
                    queue_position: state.queue.len(),
                }
            }
        };
        state.record_gauges();

        info!(job_id = %job.id, plan = %job.plan.as_str(), outcome = ?outcome, "Job submitted");
        Ok(outcome)
    }

    /// Snapshot of slots, queue depth and counters.
    pub async fn status(&self) -> QueueStatus {
        let state = self.state.lock().await;
        let active_tasks: Vec<ActiveTask> = state
            .slots
            .iter()
            .enumerate()
            .filter_map(|(slot_id, slot)| {
                slot.as_ref().map(|task| ActiveTask {
                    slot_id,
                    video_id: task.job_id,
                    plan: task.plan,
                    elapsed_seconds: task.started_at.elapsed().as_secs_f64(),
                })
            })
            .collect();

        QueueStatus {
            max_processes: self.config.max_processes,
            active_processes: active_tasks.len(),
            available_slots: self.config.max_processes - active_tasks.len(),
            active_tasks,
            queued_tasks: state.queue.len(),
            statistics: state.stats,
        }
    }

    /// Move queued jobs into free slots, head first. Returns how many moved.
    pub async fn promote_once(self: &Arc<Self>) -> usize {
        let mut state = self.state.lock().await;
        let mut promoted = 0;

        while let Some(slot_id) = state.free_slot() {
            let Some(head) = state.queue.front().cloned() else {
                break;
            };

            // Mark the head as in flight before it leaves the file.
            let marked = self
                .queue_file
                .save(
                    state
                        .queue
                        .iter()
                        .enumerate()
                        .map(|(i, job)| {
                            let entry_state = if i == 0 {
                                EntryState::Dispatching
                            } else {
                                EntryState::Queued
                            };
                            (entry_state, job.as_ref())
                        }),
                )
                .await;
            if let Err(e) = marked {
                warn!(job_id = %head.id, "Failed to mark job as dispatching: {}", e);
            }

            state.queue.pop_front();
            self.dispatch(&mut state, slot_id, head.clone());
            self.persist(&state).await;
            promoted += 1;

            info!(
                job_id = %head.id,
                slot_id,
                remaining = state.queue.len(),
                "Promoted queued job"
            );
        }

        if promoted > 0 {
            state.record_gauges();
        }
        promoted
    }

    /// Run the promoter until `shutdown` flips to true or its sender is dropped.
    pub fn spawn_promoter(self: &Arc<Self>, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        let scheduler = Arc::clone(self);
        let period = self.config.promoter_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            info!(interval_ms = period.as_millis() as u64, "Promoter started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        scheduler.promote_once().await;
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }

            info!("Promoter stopped");
        })
    }

    /// Mark `slot_id` busy and start the job. Caller holds the state lock.
    fn dispatch(self: &Arc<Self>, state: &mut SchedulerState, slot_id: usize, job: Arc<Job>) {
        state.slots[slot_id] = Some(SlotTask {
            job_id: job.id,
            plan: job.plan,
            started_at: Instant::now(),
        });
        debug!(job_id = %job.id, slot_id, "Slot occupied");

        let scheduler = Arc::clone(self);
        let runner = Arc::clone(&self.runner);
        tokio::spawn(async move {
            let job_id = job.id;
            let execution = tokio::spawn(async move { runner.run(job).await });

            let success = match execution.await {
                Ok(Ok(summary)) => {
                    info!(job_id = %job_id, slot_id, clips = summary.clips_generated, "Job completed");
                    true
                }
                Ok(Err(message)) => {
                    error!(job_id = %job_id, slot_id, "Job failed: {}", message);
                    false
                }
                Err(e) => {
                    error!(job_id = %job_id, slot_id, "Job task aborted: {}", e);
                    false
                }
            };

            scheduler.release(slot_id, success).await;
        });
    }

    /// Free a slot after its job finished.
    async fn release(&self, slot_id: usize, success: bool) {
        let mut state = self.state.lock().await;
        let Some(task) = state.slots.get_mut(slot_id).and_then(Option::take) else {
            warn!(slot_id, "Release of an idle slot");
            return;
        };

        if success {
            state.stats.completed += 1;
            counter!("clipo_jobs_completed_total").increment(1);
        } else {
            state.stats.failed += 1;
            counter!("clipo_jobs_failed_total").increment(1);
        }

        self.persist(&state).await;
        state.record_gauges();

        debug!(
            job_id = %task.job_id,
            slot_id,
            elapsed_secs = task.started_at.elapsed().as_secs_f64(),
            "Slot released"
        );
    }

    /// Mirror the in-memory queue to disk. Memory stays authoritative on failure.
    async fn persist(&self, state: &SchedulerState) {
        if let Err(e) = self
            .queue_file
            .save_queued(state.queue.iter().map(Arc::as_ref))
            .await
        {
            error!(
                path = %self.queue_file.path().display(),
                "Failed to persist queue: {}", e
            );
        }
    }
}
