use serde::{Deserialize, Serialize};

/// Objective speech metrics for one transcript.
///
/// `degenerate` marks records where rates could not be computed (no words
/// or no elapsed time); every rate is then 0 rather than a division error.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub duration_s: f64,
    pub speaking_time_s: f64,
    pub word_count: usize,
    pub wpm: f64,
    pub pause_count: usize,
    pub pause_total_s: f64,
    /// Pauses per minute of elapsed speech.
    pub pause_rate: f64,
    pub filler_count: usize,
    pub filler_rate: f64,
    pub cohesion_marker_count: usize,
    pub complexity_trigger_count: usize,
    pub sentence_count: usize,
    pub complexity_index: f64,
    /// Code of the lexicon actually used.
    pub language: String,
    pub degenerate: bool,
    pub language_fallback: bool,
}

impl MetricsRecord {
    /// An all-zero degenerate record for `language`.
    pub fn empty(language: &str, language_fallback: bool) -> Self {
        Self {
            duration_s: 0.0,
            speaking_time_s: 0.0,
            word_count: 0,
            wpm: 0.0,
            pause_count: 0,
            pause_total_s: 0.0,
            pause_rate: 0.0,
            filler_count: 0,
            filler_rate: 0.0,
            cohesion_marker_count: 0,
            complexity_trigger_count: 0,
            sentence_count: 0,
            complexity_index: 0.0,
            language: language.to_string(),
            degenerate: true,
            language_fallback,
        }
    }
}
