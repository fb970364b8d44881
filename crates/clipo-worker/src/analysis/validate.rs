//! Candidate validation and the accumulation set.

use serde_json::Value;

use clipo_models::{CandidateWindow, EXPANDABLE_DURATION, MAX_DURATION, MIN_DURATION};

/// Slack added to a widened window so float subtraction still reads >= MIN_DURATION.
const EXPANSION_SLACK: f64 = 1e-6;

/// Why a record was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    MissingTimestamps,
    NonPositiveDuration,
    TooShort,
    TooLong,
    Overlapping,
}

fn number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('s').parse().ok(),
        _ => None,
    }
    .filter(|n: &f64| n.is_finite())
}

fn text(record: &Value, key: &str) -> String {
    record
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default()
        .to_string()
}

/// Turn a raw record into a window that respects the duration bounds.
///
/// Windows between 5 and 10 seconds are widened symmetrically to 10 seconds,
/// with the start clamped at zero.
pub fn validate_record(record: &Value) -> Result<CandidateWindow, Rejection> {
    let start = number(record.get("start_time")).ok_or(Rejection::MissingTimestamps)?;
    let end = number(record.get("end_time")).ok_or(Rejection::MissingTimestamps)?;

    let mut start = start.max(0.0);
    let mut end = end;
    let duration = end - start;

    if duration <= 0.0 {
        return Err(Rejection::NonPositiveDuration);
    }
    if (EXPANDABLE_DURATION..MIN_DURATION).contains(&duration) {
        let pad = (MIN_DURATION - duration) / 2.0;
        start = (start - pad).max(0.0);
        end = (end + pad).max(start + MIN_DURATION);
        if end - start < MIN_DURATION {
            end = start + MIN_DURATION + EXPANSION_SLACK;
        }
    }

    let duration = end - start;
    if duration < MIN_DURATION {
        return Err(Rejection::TooShort);
    }
    if duration > MAX_DURATION {
        return Err(Rejection::TooLong);
    }

    let viral_score = number(record.get("viral_score"))
        .map(|s| s.round().clamp(0.0, 100.0) as u8)
        .unwrap_or(0);

    Ok(CandidateWindow {
        start_time: start,
        end_time: end,
        text: text(record, "text"),
        viral_score,
        topic: text(record, "topic"),
        reason: text(record, "reason"),
    })
}

/// Accepted windows across all chunks and attempts.
#[derive(Debug, Default, Clone)]
pub struct Accumulator {
    accepted: Vec<CandidateWindow>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a window unless it overlaps an accepted one by more than the tolerance.
    pub fn offer(&mut self, window: CandidateWindow) -> Result<(), Rejection> {
        if self.accepted.iter().any(|w| w.conflicts_with(&window)) {
            return Err(Rejection::Overlapping);
        }
        self.accepted.push(window);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.accepted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }

    /// Highest scores first, at most `target_count`.
    pub fn into_ranked(mut self, target_count: usize) -> Vec<CandidateWindow> {
        self.accepted.sort_by(|a, b| b.viral_score.cmp(&a.viral_score));
        self.accepted.truncate(target_count);
        self.accepted
    }
}
