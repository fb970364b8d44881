//! Highlight windows proposed by analysis and chosen for rendering.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Shortest clip accepted, in seconds.
pub const MIN_DURATION: f64 = 10.0;
/// Longest clip accepted, in seconds.
pub const MAX_DURATION: f64 = 80.0;
/// Shortest candidate that is stretched to `MIN_DURATION` instead of dropped.
pub const EXPANDABLE_DURATION: f64 = 5.0;
/// Largest overlap tolerated between two selected windows, in seconds.
pub const OVERLAP_TOLERANCE: f64 = 5.0;

/// A validated highlight proposal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CandidateWindow {
    pub start_time: f64,
    pub end_time: f64,
    #[serde(default)]
    pub text: String,
    /// Virality score, 0-100
    #[serde(default)]
    pub viral_score: u8,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub reason: String,
}

impl CandidateWindow {
    pub fn new(start_time: f64, end_time: f64, viral_score: u8) -> Self {
        Self {
            start_time,
            end_time,
            text: String::new(),
            viral_score,
            topic: String::new(),
            reason: String::new(),
        }
    }

    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// Seconds shared with another window (zero when disjoint).
    pub fn overlap_with(&self, other: &CandidateWindow) -> f64 {
        let start = self.start_time.max(other.start_time);
        let end = self.end_time.min(other.end_time);
        (end - start).max(0.0)
    }

    /// True if the overlap with `other` exceeds the tolerance.
    pub fn conflicts_with(&self, other: &CandidateWindow) -> bool {
        self.overlap_with(other) > OVERLAP_TOLERANCE
    }
}

/// A candidate that made the final ranked cut.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SelectedWindow {
    /// 0-based rank in the final selection
    pub index: usize,
    #[serde(flatten)]
    pub window: CandidateWindow,
}

impl SelectedWindow {
    pub fn new(index: usize, window: CandidateWindow) -> Self {
        Self { index, window }
    }

    pub fn duration(&self) -> f64 {
        self.window.duration()
    }
}
