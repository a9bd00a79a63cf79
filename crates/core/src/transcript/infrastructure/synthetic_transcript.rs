use crate::transcript::domain::transcript::{InputError, Transcript, TranscriptSegment, WordTiming};
use crate::transcript::domain::transcript_source::TranscriptSource;

pub const DEFAULT_WORD_DURATION_S: f64 = 0.4;
pub const DEFAULT_WORD_GAP_S: f64 = 0.1;
pub const DEFAULT_SENTENCE_GAP_S: f64 = 0.6;

/// Deterministic transcript generator standing in for a transcription
/// engine: one segment per sentence, evenly timed native words.
#[derive(Clone, Debug)]
pub struct SyntheticTranscript {
    input_id: String,
    sentences: Vec<String>,
    word_duration_s: f64,
    word_gap_s: f64,
    sentence_gap_s: f64,
}

impl SyntheticTranscript {
    pub fn new(input_id: &str, sentences: &[&str]) -> Self {
        Self {
            input_id: input_id.to_string(),
            sentences: sentences.iter().map(|s| s.to_string()).collect(),
            word_duration_s: DEFAULT_WORD_DURATION_S,
            word_gap_s: DEFAULT_WORD_GAP_S,
            sentence_gap_s: DEFAULT_SENTENCE_GAP_S,
        }
    }

    pub fn with_timing(mut self, word_duration_s: f64, word_gap_s: f64, sentence_gap_s: f64) -> Self {
        self.word_duration_s = word_duration_s;
        self.word_gap_s = word_gap_s;
        self.sentence_gap_s = sentence_gap_s;
        self
    }

    pub fn build(&self) -> Result<Transcript, InputError> {
        let mut segments = Vec::with_capacity(self.sentences.len());
        let mut cursor = 0.0;

        for sentence in &self.sentences {
            let mut words = Vec::new();
            for piece in sentence.split_whitespace() {
                let start_s = cursor;
                let end_s = start_s + self.word_duration_s;
                words.push(WordTiming {
                    word: piece.to_string(),
                    start_s,
                    end_s,
                    confidence: Some(1.0),
                });
                cursor = end_s + self.word_gap_s;
            }
            let (Some(first), Some(last)) = (words.first(), words.last()) else {
                continue;
            };
            let (seg_start, seg_end) = (first.start_s, last.end_s);
            cursor = seg_end + self.sentence_gap_s;
            segments.push(TranscriptSegment::new(sentence, seg_start, seg_end, 1.0).with_words(words));
        }

        Transcript::new(segments)
    }

    /// `word_count` copies of `word` filling `[0, duration_s]` back to back,
    /// so no gap between words is a pause.
    pub fn uniform(word: &str, word_count: usize, duration_s: f64) -> Result<Transcript, InputError> {
        if word_count == 0 {
            return Transcript::new(Vec::new());
        }
        let n = word_count as f64;
        let words: Vec<WordTiming> = (0..word_count)
            .map(|i| WordTiming {
                word: word.to_string(),
                start_s: duration_s * i as f64 / n,
                end_s: duration_s * (i + 1) as f64 / n,
                confidence: Some(1.0),
            })
            .collect();
        let text = vec![word; word_count].join(" ");
        Transcript::new(vec![
            TranscriptSegment::new(&text, 0.0, duration_s, 1.0).with_words(words)
        ])
    }
}

impl TranscriptSource for SyntheticTranscript {
    fn load(&self) -> Result<Transcript, InputError> {
        self.build()
    }

    fn input_id(&self) -> String {
        self.input_id.clone()
    }
}
