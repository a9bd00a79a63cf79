use super::rubric_parser::parse_rubric_response;
use super::rubric_prompt::{build_repair_prompt, build_rubric_prompt};
use super::rubric_record::RubricRecord;
use super::scorer::{Scorer, ScorerError, TransportError};
use crate::metrics::domain::metrics_record::MetricsRecord;

/// Attempts per scorer call: the first try plus one retry with the same prompt.
pub const MAX_TRANSPORT_ATTEMPTS: usize = 2;

/// Asks a scorer for a rubric and turns its answer into a [`RubricRecord`].
///
/// Malformed answers are never an error: after one repair round-trip the
/// exchange gives up and returns a rubric whose levels are all `unknown`.
/// Only transport failures (the scorer call itself failing twice) surface.
#[derive(Debug, Clone, Copy, Default)]
pub struct RubricExchange;

impl RubricExchange {
    pub fn new() -> Self {
        Self
    }

    pub fn request_rubric(
        &self,
        transcript: &str,
        metrics: &MetricsRecord,
        scorer: &dyn Scorer,
    ) -> Result<RubricRecord, TransportError> {
        let prompt = build_rubric_prompt(transcript, metrics);
        let first = call_scorer(scorer, &prompt)?;
        let first_error = match parse_rubric_response(&first) {
            Ok(rubric) => return Ok(rubric),
            Err(e) => e,
        };
        log::warn!("Scorer response unusable ({first_error}), requesting a JSON-only reply");

        let repair = build_repair_prompt(&prompt, &first);
        let second = call_scorer(scorer, &repair)?;
        match parse_rubric_response(&second) {
            Ok(rubric) => Ok(rubric),
            Err(e) => {
                log::warn!("Repair response unusable ({e}), rubric levels set to unknown");
                Ok(RubricRecord::unknown(&second))
            }
        }
    }
}

fn call_scorer(scorer: &dyn Scorer, prompt: &str) -> Result<String, TransportError> {
    let mut last = ScorerError::Failed("scorer was not called".to_string());
    for attempt in 1..=MAX_TRANSPORT_ATTEMPTS {
        match scorer.score(prompt) {
            Ok(response) => return Ok(response),
            Err(e) => {
                log::warn!("Scorer attempt {attempt}/{MAX_TRANSPORT_ATTEMPTS} failed: {e}");
                last = e;
            }
        }
    }
    Err(TransportError {
        attempts: MAX_TRANSPORT_ATTEMPTS,
        last,
    })
}
