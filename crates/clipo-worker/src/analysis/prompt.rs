//! Highlight extraction prompt.

use clipo_models::{MAX_DURATION, MIN_DURATION};

/// Fewest candidates requested from a single chunk.
pub const MIN_CANDIDATES_PER_CHUNK: usize = 30;

/// Candidates to ask for per chunk.
pub fn candidates_per_chunk(target_count: usize, chunk_count: usize) -> usize {
    MIN_CANDIDATES_PER_CHUNK.max(target_count / chunk_count.max(1))
}

/// Build the reasoning prompt for one transcript chunk.
pub fn build_prompt(chunk: &str, requested: usize) -> String {
    let min = MIN_DURATION as u32;
    let max = MAX_DURATION as u32;
    format!(
        r#"You are an elite short-form video editor. From the transcript below, extract UP TO {requested} clips that are viral, emotionally powerful, controversial, or socially impactful.

TRANSCRIPT WITH TIMESTAMPS:
{chunk}
RULES:
1) Duration: every clip MUST be {min}-{max} seconds long.
2) Structure: start and end on full sentences, no mid-sentence cuts.
3) Timestamps: use ONLY timestamps that appear in the transcript above.
4) No overlap: clips MUST be in chronological order and never share the same seconds.
5) Diversity: each clip MUST cover a different topic.
6) Virality: prefer surprising, emotional, or debate-triggering moments. Assign viral_score from 0 to 100.
7) Hook: each clip MUST open with a strong hook.
8) Output: STRICT JSON ONLY, an array of objects with start_time, end_time, text, viral_score, topic, reason.
   No markdown, no code fences, no comments. "reason" is one complete sentence.

EXAMPLE OUTPUT:
[
  {{"start_time": 120.5, "end_time": 145.2, "text": "Excerpt", "viral_score": 85, "topic": "Topic", "reason": "Why it works."}},
  {{"start_time": 200.0, "end_time": 230.5, "text": "Another excerpt", "viral_score": 78, "topic": "Other topic", "reason": "Why it works."}}
]

Extract {requested} high-quality clips of {min}-{max} seconds each.
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidates_per_chunk_floor() {
        assert_eq!(candidates_per_chunk(12, 2), 30);
        assert_eq!(candidates_per_chunk(24, 0), 30);
        assert_eq!(candidates_per_chunk(100, 2), 50);
    }

    #[test]
    fn test_prompt_mentions_bounds_and_count() {
        let prompt = build_prompt("[0.00s → 4.00s] hello\n", 30);
        assert!(prompt.contains("UP TO 30 clips"));
        assert!(prompt.contains("10-80 seconds"));
        assert!(prompt.contains("[0.00s → 4.00s] hello"));
        assert!(prompt.contains(r#"{"start_time": 120.5"#));
    }
}
