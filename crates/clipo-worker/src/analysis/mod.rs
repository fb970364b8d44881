//! Segmented highlight analysis and selection.
//!
//! The transcript is cut into chunks, each chunk is sent to the reasoning
//! service a fixed number of times, and every parseable answer feeds one
//! accumulation set. The best windows across all chunks win.

pub mod chunk;
pub mod parse;
pub mod prompt;
pub mod validate;

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tracing::{debug, info, warn};

use clipo_ml_client::ReasoningClient;
use clipo_models::{format_transcript, ContentSegment, SelectedWindow};

use crate::config::WorkerConfig;
use crate::error::WorkerError;

pub use chunk::chunk_transcript;
pub use parse::{extract_payload, parse_records};
pub use prompt::{build_prompt, candidates_per_chunk};
pub use validate::{validate_record, Accumulator, Rejection};

const RATE_LIMIT_BACKOFF: Duration = Duration::from_secs(1);
const ERROR_BACKOFF: Duration = Duration::from_secs(3);

/// Picks the best highlight windows from a transcript.
pub struct SelectionEngine {
    reasoning: Arc<dyn ReasoningClient>,
    chunk_chars: usize,
    attempts: u32,
}

impl SelectionEngine {
    pub fn new(reasoning: Arc<dyn ReasoningClient>, chunk_chars: usize, attempts: u32) -> Self {
        Self {
            reasoning,
            chunk_chars: chunk_chars.max(1),
            attempts: attempts.max(1),
        }
    }

    pub fn from_config(reasoning: Arc<dyn ReasoningClient>, config: &WorkerConfig) -> Self {
        Self::new(reasoning, config.analysis_chunk_chars, config.analysis_attempts)
    }

    /// Up to `target_count` non-overlapping windows, highest score first.
    ///
    /// Empty when no attempt on any chunk produced a valid window.
    pub async fn select_highlights(
        &self,
        transcript: &[ContentSegment],
        target_count: usize,
    ) -> Vec<SelectedWindow> {
        let formatted = format_transcript(transcript);
        let chunks = chunk_transcript(&formatted, self.chunk_chars);
        let requested = candidates_per_chunk(target_count, chunks.len());

        info!(
            transcript_chars = formatted.chars().count(),
            chunks = chunks.len(),
            requested_per_chunk = requested,
            target_count,
            "Starting highlight analysis"
        );

        let mut accumulator = Accumulator::new();
        for (index, chunk) in chunks.iter().enumerate() {
            let before = accumulator.len();
            self.analyze_chunk(index, chunks.len(), chunk, requested, &mut accumulator)
                .await;
            info!(
                chunk = index + 1,
                of = chunks.len(),
                added = accumulator.len() - before,
                total = accumulator.len(),
                "Chunk analyzed"
            );
        }

        let accumulated = accumulator.len();
        let selected: Vec<SelectedWindow> = accumulator
            .into_ranked(target_count)
            .into_iter()
            .enumerate()
            .map(|(index, window)| SelectedWindow::new(index, window))
            .collect();

        info!(accumulated, selected = selected.len(), "Highlight selection complete");
        selected
    }

    async fn analyze_chunk(
        &self,
        index: usize,
        chunk_count: usize,
        chunk: &str,
        requested: usize,
        accumulator: &mut Accumulator,
    ) {
        let prompt = build_prompt(chunk, requested);

        for attempt in 1..=self.attempts {
            let response = match self.reasoning.complete(&prompt).await {
                Ok(text) => text,
                Err(e) => {
                    counter!("clipo_analysis_attempts_total", "outcome" => "service_error")
                        .increment(1);
                    warn!(
                        chunk = index + 1,
                        of = chunk_count,
                        attempt,
                        "Reasoning request failed: {}",
                        e
                    );
                    if attempt < self.attempts {
                        let backoff = if e.is_rate_limited() {
                            RATE_LIMIT_BACKOFF
                        } else {
                            ERROR_BACKOFF
                        };
                        tokio::time::sleep(backoff).await;
                    }
                    continue;
                }
            };

            let Some((step, records)) = parse_records(&response) else {
                counter!("clipo_analysis_attempts_total", "outcome" => "malformed").increment(1);
                let preview: String = response.chars().take(200).collect();
                warn!(
                    chunk = index + 1,
                    attempt,
                    "{}",
                    WorkerError::analysis_malformed(preview)
                );
                continue;
            };
            counter!("clipo_analysis_attempts_total", "outcome" => "parsed").increment(1);

            let mut accepted = 0;
            let mut rejected = 0;
            for record in &records {
                match validate_record(record).and_then(|w| accumulator.offer(w)) {
                    Ok(()) => accepted += 1,
                    Err(reason) => {
                        rejected += 1;
                        debug!(chunk = index + 1, ?reason, "Candidate rejected");
                    }
                }
            }

            debug!(
                chunk = index + 1,
                attempt,
                repair_step = step,
                records = records.len(),
                accepted,
                rejected,
                "Attempt parsed"
            );
        }
    }
}
