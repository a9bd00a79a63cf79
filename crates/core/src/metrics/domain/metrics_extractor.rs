use super::metrics_record::MetricsRecord;
use super::pause_interval::{detect_pauses, PauseInterval};
use crate::lexicon::domain::lexicon_store::LexiconStore;
use crate::shared::constants::DEFAULT_PAUSE_THRESHOLD_S;
use crate::shared::error::ConfigurationError;
use crate::transcript::domain::transcript::Transcript;
use crate::transcript::domain::word_token::sentence_count;

/// Turns a timed transcript into a [`MetricsRecord`].
///
/// Pure: the same transcript and language always produce the same record.
#[derive(Clone, Debug)]
pub struct MetricsExtractor {
    lexicons: LexiconStore,
    pause_threshold_s: f64,
}

impl MetricsExtractor {
    pub fn new(lexicons: LexiconStore, pause_threshold_s: f64) -> Self {
        Self {
            lexicons,
            pause_threshold_s,
        }
    }

    pub fn pause_threshold_s(&self) -> f64 {
        self.pause_threshold_s
    }

    /// Fails only when `language` has no lexicon and no fallback exists.
    /// Transcripts without words yield a degenerate record.
    pub fn extract(
        &self,
        transcript: &Transcript,
        language: &str,
    ) -> Result<MetricsRecord, ConfigurationError> {
        let resolved = self.lexicons.resolve(language)?;
        let lexicon = resolved.lexicon;
        let language_code = resolved.language.code();

        let tokens = transcript.word_tokens();
        let (Some(first), Some(last)) = (tokens.first(), tokens.last()) else {
            return Ok(MetricsRecord::empty(language_code, resolved.fallback));
        };

        let words: Vec<String> = tokens.iter().map(|t| t.word.clone()).collect();
        let word_count = words.len();
        let duration_s = (last.end_s - first.start_s).max(0.0);
        let degenerate = duration_s <= 0.0;
        let minutes = duration_s / 60.0;

        let pauses = detect_pauses(&tokens, self.pause_threshold_s);
        let pause_count = pauses.len();
        let pause_total_s: f64 = pauses.iter().map(PauseInterval::duration).sum();

        // Words inside a cohesion marker are not fillers.
        let mut in_marker = vec![false; word_count];
        let cohesion_matches = lexicon.cohesion_markers().find_matches(&words);
        for m in &cohesion_matches {
            in_marker[m.start..m.start + m.len].fill(true);
        }
        let filler_count = words
            .iter()
            .zip(&in_marker)
            .filter(|(w, marked)| !**marked && lexicon.is_filler(w))
            .count();

        let complexity_trigger_count = lexicon.complexity_triggers().find_matches(&words).len();
        let sentences = sentence_count(&transcript.text());

        let (wpm, pause_rate) = if degenerate {
            (0.0, 0.0)
        } else {
            (word_count as f64 / minutes, pause_count as f64 / minutes)
        };

        Ok(MetricsRecord {
            duration_s,
            speaking_time_s: (duration_s - pause_total_s).max(0.0),
            word_count,
            wpm,
            pause_count,
            pause_total_s,
            pause_rate,
            filler_count,
            filler_rate: filler_count as f64 / word_count as f64,
            cohesion_marker_count: cohesion_matches.len(),
            complexity_trigger_count,
            sentence_count: sentences,
            complexity_index: complexity_trigger_count as f64 / sentences.max(1) as f64,
            language: language_code.to_string(),
            degenerate,
            language_fallback: resolved.fallback,
        })
    }
}

impl Default for MetricsExtractor {
    fn default() -> Self {
        Self::new(LexiconStore::builtin(), DEFAULT_PAUSE_THRESHOLD_S)
    }
}
