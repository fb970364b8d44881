//! Job scheduler.
//!
//! A fixed pool of execution slots fronted by a FIFO queue that is mirrored
//! to a JSON file. Submissions either take a free slot immediately or wait in
//! the queue; a background promoter moves queued jobs into slots as they free
//! up.

pub mod config;
pub mod error;
pub mod persist;
pub mod runner;
pub mod scheduler;

pub use config::SchedulerConfig;
pub use error::{QueueError, QueueResult};
pub use persist::{EntryState, QueueEntry, QueueFile};
pub use runner::{JobRunner, RunSummary};
pub use scheduler::Scheduler;
