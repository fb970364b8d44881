//! Watermark overlay for free-plan renders.
//!
//! The overlay is injected with the `movie` source filter so a render keeps a
//! single FFmpeg input and a single `-vf` graph.

use std::path::Path;
use tracing::debug;

/// Default watermark asset path.
pub const DEFAULT_WATERMARK_PATH: &str = "assets/watermark.png";

/// Configuration for watermark overlay.
#[derive(Debug, Clone)]
pub struct WatermarkConfig {
    /// Path to watermark image (PNG with transparency)
    pub image_path: String,
    /// Watermark width as a fraction of the output width
    pub width_ratio: f32,
    /// Gap to the right edge (pixels)
    pub margin_right: u32,
    /// Opacity (0.0 to 1.0)
    pub opacity: f32,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            image_path: DEFAULT_WATERMARK_PATH.to_string(),
            width_ratio: 0.3,
            margin_right: 20,
            opacity: 0.8,
        }
    }
}

impl WatermarkConfig {
    pub fn with_image_path(mut self, path: impl Into<String>) -> Self {
        self.image_path = path.into();
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    pub fn is_available(&self) -> bool {
        Path::new(&self.image_path).is_file()
    }

    /// Overlay width in pixels for a given output width (kept even).
    pub fn overlay_width(&self, output_width: u32) -> u32 {
        let w = (output_width as f32 * self.width_ratio).round() as u32;
        (w / 2 * 2).max(2)
    }
}

fn escape_filter_path(path: &str) -> String {
    path.replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace(':', "\\:")
}

/// Wrap `base_filter` in a graph that overlays the watermark right-centre.
///
/// Returns `None` when the image is missing so callers can render without it.
pub fn build_vf_with_watermark(
    base_filter: &str,
    output_width: u32,
    config: &WatermarkConfig,
) -> Option<String> {
    if !config.is_available() {
        debug!(path = %config.image_path, "Watermark image not found");
        return None;
    }

    Some(build_watermark_graph(base_filter, output_width, config))
}

fn build_watermark_graph(base_filter: &str, output_width: u32, config: &WatermarkConfig) -> String {
    let mut wm = format!(
        "movie='{}',scale={}:-1,format=rgba",
        escape_filter_path(&config.image_path),
        config.overlay_width(output_width)
    );
    if config.opacity < 1.0 {
        wm.push_str(&format!(",colorchannelmixer=aa={:.2}", config.opacity));
    }

    format!(
        "[in]{}[base];{}[wm];[base][wm]overlay=W-w-{}:(H-h)/2:format=auto",
        base_filter, wm, config.margin_right
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_overlay_width() {
        let config = WatermarkConfig::default();
        assert_eq!(config.overlay_width(720), 216);
        assert_eq!(config.overlay_width(1080), 324);
    }

    #[test]
    fn test_missing_image_disables_overlay() {
        let config = WatermarkConfig::default().with_image_path("/nonexistent/wm.png");
        assert!(build_vf_with_watermark("scale=720:1280", 720, &config).is_none());
    }

    #[test]
    fn test_overlay_graph() {
        let file = NamedTempFile::new().unwrap();
        let config = WatermarkConfig::default()
            .with_image_path(file.path().to_string_lossy().to_string())
            .with_opacity(0.5);

        let graph = build_vf_with_watermark("scale=720:1280", 720, &config).unwrap();
        assert!(graph.starts_with("[in]scale=720:1280[base];movie='"));
        assert!(graph.contains("scale=216:-1"));
        assert!(graph.contains("colorchannelmixer=aa=0.50"));
        assert!(graph.ends_with("overlay=W-w-20:(H-h)/2:format=auto"));
    }

    #[test]
    fn test_escape_filter_path() {
        assert_eq!(escape_filter_path("C:\\wm's.png"), "C\\:\\\\wm\\'s.png");
    }
}
