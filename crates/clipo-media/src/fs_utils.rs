//! Filesystem helpers shared by acquisition and rendering.

use std::path::Path;
use tokio::fs;
use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// EXDEV on Linux and macOS.
const CROSS_DEVICE_ERRNO: i32 = 18;

/// Move `src` to `dst`, copying across filesystems when a rename is refused.
pub async fn move_file(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> MediaResult<()> {
    let src = src.as_ref();
    let dst = dst.as_ref();

    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).await?;
    }

    match fs::rename(src, dst).await {
        Ok(()) => Ok(()),
        Err(e) if e.raw_os_error() == Some(CROSS_DEVICE_ERRNO) => {
            debug!(src = %src.display(), dst = %dst.display(), "cross-device move, copying");
            let staging = dst.with_extension("moving");
            fs::copy(src, &staging).await?;
            fs::rename(&staging, dst).await?;
            fs::remove_file(src).await?;
            Ok(())
        }
        Err(e) => Err(MediaError::from(e)),
    }
}

/// Size of a regular file, or `None` when it does not exist.
pub async fn file_size(path: impl AsRef<Path>) -> Option<u64> {
    match fs::metadata(path.as_ref()).await {
        Ok(meta) if meta.is_file() => Some(meta.len()),
        _ => None,
    }
}
