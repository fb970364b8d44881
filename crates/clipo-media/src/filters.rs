//! FFmpeg video filter construction for vertical clips.

use clipo_models::{QualityProfile, VisualFilter};

/// Centre crop to 9:16, whichever side of the source is the limiting one.
///
/// Wide sources keep full height and lose the sides; tall sources keep full
/// width and lose top and bottom. Dimensions are forced even for H.264.
pub const FILTER_CENTER_VERTICAL_CROP: &str =
    "crop='trunc(min(iw,ih*9/16)/2)*2':'trunc(min(ih,iw*16/9)/2)*2':'(iw-min(iw,ih*9/16))/2':'(ih-min(ih,iw*16/9))/2'";

/// Filter-graph step for a look, if it has one.
fn look(visual: VisualFilter) -> Option<&'static str> {
    match visual {
        VisualFilter::None => None,
        VisualFilter::Vivid => Some("eq=contrast=1.08:saturation=1.25"),
        VisualFilter::Grayscale => Some("hue=s=0"),
    }
}

/// Crop, scale, frame rate and look, as a comma-separated filter chain.
pub fn build_vertical_filter(quality: &QualityProfile, visual: VisualFilter) -> String {
    let (width, height) = quality.resolution.dimensions();
    let mut chain = vec![
        FILTER_CENTER_VERTICAL_CROP.to_string(),
        format!("scale={}:{}:flags=lanczos", width, height),
        "setsar=1".to_string(),
        format!("fps={}", quality.fps),
    ];
    if let Some(step) = look(visual) {
        chain.push(step.to_string());
    }
    chain.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipo_models::Resolution;

    #[test]
    fn test_vertical_filter() {
        let filter = build_vertical_filter(
            &QualityProfile::new(Resolution::P1080, 60),
            VisualFilter::None,
        );
        assert!(filter.starts_with("crop="));
        assert!(filter.contains("scale=1080:1920"));
        assert!(filter.ends_with("fps=60"));
    }

    #[test]
    fn test_visual_filter_appended() {
        let filter = build_vertical_filter(&QualityProfile::default(), VisualFilter::Vivid);
        assert!(filter.contains("scale=720:1280"));
        assert!(filter.ends_with("eq=contrast=1.08:saturation=1.25"));

        let filter = build_vertical_filter(&QualityProfile::default(), VisualFilter::Grayscale);
        assert!(filter.ends_with("fps=30,hue=s=0"));
    }
}
