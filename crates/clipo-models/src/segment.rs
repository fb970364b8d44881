//! Transcript segments.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// One timed span of transcribed speech.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ContentSegment {
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    /// Spoken text
    pub text: String,
}

impl ContentSegment {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    /// Render as a timestamped transcript line (no trailing newline).
    pub fn to_line(&self) -> String {
        format!("[{:.2}s → {:.2}s] {}", self.start, self.end, self.text.trim())
    }
}

/// Sort segments by start time in place.
pub fn sort_segments(segments: &mut [ContentSegment]) {
    segments.sort_by(|a, b| a.start.total_cmp(&b.start));
}

/// Join segments into the timestamped transcript sent to the reasoning model.
pub fn format_transcript(segments: &[ContentSegment]) -> String {
    let mut out = String::new();
    for seg in segments {
        let _ = writeln!(out, "{}", seg.to_line());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_transcript() {
        let segs = vec![
            ContentSegment::new(0.0, 4.5, " Hello there "),
            ContentSegment::new(4.5, 9.123, "General Kenobi"),
        ];
        let text = format_transcript(&segs);
        assert_eq!(
            text,
            "[0.00s → 4.50s] Hello there\n[4.50s → 9.12s] General Kenobi\n"
        );
    }

    #[test]
    fn test_sort_segments() {
        let mut segs = vec![
            ContentSegment::new(10.0, 12.0, "b"),
            ContentSegment::new(1.0, 2.0, "a"),
        ];
        sort_segments(&mut segs);
        assert_eq!(segs[0].text, "a");
    }
}
