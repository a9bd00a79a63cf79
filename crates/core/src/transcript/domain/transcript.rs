use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::word_token::{self, WordToken};
use crate::shared::constants::TIMESTAMP_TOLERANCE_S;

#[derive(Error, Debug)]
pub enum InputError {
    #[error("transcript contains no segments")]
    Empty,
    #[error("segment {index} has a non-finite timestamp or confidence")]
    NonFiniteTime { index: usize },
    #[error("segment {index} ends before it starts ({start_s}s > {end_s}s)")]
    InvertedSpan {
        index: usize,
        start_s: f64,
        end_s: f64,
    },
    #[error("segment {index} starts at {start_s}s, before the previous one ends at {previous_end_s}s")]
    NonMonotonic {
        index: usize,
        start_s: f64,
        previous_end_s: f64,
    },
    #[error("segment {index} has confidence {confidence} outside [0, 1]")]
    ConfidenceOutOfRange { index: usize, confidence: f64 },
    #[error("segment {index}: word '{word}' has invalid timing")]
    InvalidWordTiming { index: usize, word: String },
    #[error("failed to read transcript {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse transcript {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Per-word timing supplied natively by a transcription source.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WordTiming {
    pub word: String,
    pub start_s: f64,
    pub end_s: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub text: String,
    pub start_s: f64,
    pub end_s: f64,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub words: Option<Vec<WordTiming>>,
}

impl TranscriptSegment {
    pub fn new(text: &str, start_s: f64, end_s: f64, confidence: f64) -> Self {
        Self {
            text: text.to_string(),
            start_s,
            end_s,
            confidence,
            words: None,
        }
    }

    pub fn with_words(mut self, words: Vec<WordTiming>) -> Self {
        self.words = Some(words);
        self
    }

    pub fn duration(&self) -> f64 {
        self.end_s - self.start_s
    }
}

/// A validated, time-ordered sequence of non-overlapping segments.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Transcript {
    segments: Vec<TranscriptSegment>,
}

impl Transcript {
    /// Validates ordering and value ranges. An empty segment list is
    /// accepted here; the assessment pipeline decides whether it is usable.
    pub fn new(segments: Vec<TranscriptSegment>) -> Result<Self, InputError> {
        let mut previous_end: Option<f64> = None;
        // Start of the last token, native or distributed, across all segments.
        let mut previous_token_start = f64::NEG_INFINITY;

        for (index, seg) in segments.iter().enumerate() {
            if !seg.start_s.is_finite() || !seg.end_s.is_finite() || !seg.confidence.is_finite() {
                return Err(InputError::NonFiniteTime { index });
            }
            if seg.start_s > seg.end_s {
                return Err(InputError::InvertedSpan {
                    index,
                    start_s: seg.start_s,
                    end_s: seg.end_s,
                });
            }
            if let Some(previous_end_s) = previous_end {
                if seg.start_s < previous_end_s {
                    return Err(InputError::NonMonotonic {
                        index,
                        start_s: seg.start_s,
                        previous_end_s,
                    });
                }
            }
            if !(0.0..=1.0).contains(&seg.confidence) {
                return Err(InputError::ConfidenceOutOfRange {
                    index,
                    confidence: seg.confidence,
                });
            }
            match seg.words.as_deref() {
                Some(words) if !words.is_empty() => {
                    let lower = seg.start_s - TIMESTAMP_TOLERANCE_S;
                    let upper = seg.end_s + TIMESTAMP_TOLERANCE_S;
                    for w in words {
                        let valid = w.start_s.is_finite()
                            && w.end_s.is_finite()
                            && w.start_s <= w.end_s
                            && w.start_s >= lower
                            && w.end_s <= upper
                            && w.start_s >= previous_token_start
                            && w.confidence.map_or(true, |c| (0.0..=1.0).contains(&c));
                        if !valid {
                            return Err(InputError::InvalidWordTiming {
                                index,
                                word: w.word.clone(),
                            });
                        }
                        previous_token_start = w.start_s;
                    }
                }
                _ => {
                    if seg.start_s < previous_token_start {
                        return Err(InputError::NonMonotonic {
                            index,
                            start_s: seg.start_s,
                            previous_end_s: previous_token_start,
                        });
                    }
                    previous_token_start = seg.start_s;
                }
            }
            previous_end = Some(seg.end_s);
        }

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[TranscriptSegment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Full transcript text: trimmed segment texts joined by single spaces.
    pub fn text(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Word tokens with timing, preferring native word timestamps when a
    /// segment has them and distributing the segment span otherwise.
    pub fn word_tokens(&self) -> Vec<WordToken> {
        let mut tokens = Vec::new();
        for seg in &self.segments {
            match seg.words.as_deref() {
                Some(words) if !words.is_empty() => {
                    for w in words {
                        tokens.extend(word_token::distribute(&w.word, w.start_s, w.end_s));
                    }
                }
                _ => tokens.extend(word_token::distribute(&seg.text, seg.start_s, seg.end_s)),
            }
        }
        tokens
    }
}
