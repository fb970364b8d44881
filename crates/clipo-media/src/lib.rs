//! Media acquisition and FFmpeg processing.
//!
//! This crate provides:
//! - The source acquisition fallback chain (yt-dlp)
//! - Type-safe FFmpeg command building and running
//! - Local and remote media probing
//! - Vertical reframing filters and the free-plan watermark
//! - The `MediaEncoder` capability used by the render stage

pub mod acquire;
pub mod command;
pub mod encode;
pub mod error;
pub mod filters;
pub mod fs_utils;
pub mod probe;
pub mod watermark;

pub use acquire::{
    AccessStrategy, AcquireConfig, Acquirer, AcquisitionPhase, Downloader, MetadataProbe, YtDlp,
};
pub use command::{
    check_ffmpeg, check_ffprobe, check_ytdlp, CommandRunner, FfmpegCommand, FfmpegRunner,
};
pub use encode::{ClipSpec, FfmpegEncoder, MediaEncoder};
pub use error::{MediaError, MediaResult};
pub use clipo_models::VisualFilter;
pub use filters::build_vertical_filter;
pub use probe::{probe_remote_duration, probe_video, VideoInfo};
pub use watermark::{WatermarkConfig, DEFAULT_WATERMARK_PATH};
