//! Clip processing pipeline.
//!
//! This crate provides:
//! - `ClipPipeline`: the `JobRunner` the scheduler drives, one job at a time
//! - The segmented highlight analysis and selection engine
//! - The parallel vertical render stage
//! - Transcript preparation from the source audio track

pub mod analysis;
pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod render;
pub mod transcript;

#[cfg(test)]
mod testing;

pub use analysis::SelectionEngine;
pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use logging::JobLogger;
pub use pipeline::ClipPipeline;
pub use render::{RenderReport, RenderStage};
pub use transcript::TranscriptBuilder;
