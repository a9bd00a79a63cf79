use std::sync::OnceLock;

use regex::Regex;

/// A normalised word with timing. `start_s <= end_s` always holds, and
/// tokens derived from a valid transcript are non-decreasing in `start_s`.
#[derive(Clone, Debug, PartialEq)]
pub struct WordToken {
    pub word: String,
    pub start_s: f64,
    pub end_s: f64,
}

fn word_pattern() -> &'static Regex {
    static WORD: OnceLock<Regex> = OnceLock::new();
    WORD.get_or_init(|| Regex::new(r"[\p{L}\p{N}'’]+").expect("word pattern is valid"))
}

fn sentence_pattern() -> &'static Regex {
    static SENTENCE_END: OnceLock<Regex> = OnceLock::new();
    SENTENCE_END.get_or_init(|| Regex::new(r"[.!?…]+").expect("sentence pattern is valid"))
}

/// Lowercased words: runs of letters, digits and apostrophes, with
/// apostrophes trimmed from both ends.
pub fn tokenize(text: &str) -> Vec<String> {
    word_pattern()
        .find_iter(text)
        .map(|m| m.as_str().trim_matches(|c| c == '\'' || c == '’').to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

/// Number of sentences that contain at least one word, splitting on
/// terminal punctuation. Text without terminal punctuation is one sentence.
pub fn sentence_count(text: &str) -> usize {
    sentence_pattern()
        .split(text)
        .filter(|s| !tokenize(s).is_empty())
        .count()
}

/// Tokenises `text` and spreads `[start_s, end_s]` over the tokens in
/// proportion to their character length.
pub fn distribute(text: &str, start_s: f64, end_s: f64) -> Vec<WordToken> {
    let words = tokenize(text);
    if words.is_empty() {
        return Vec::new();
    }

    let lengths: Vec<usize> = words.iter().map(|w| w.chars().count()).collect();
    let total: usize = lengths.iter().sum();
    let span = end_s - start_s;
    let last = words.len() - 1;

    let mut consumed = 0usize;
    words
        .into_iter()
        .zip(lengths)
        .enumerate()
        .map(|(i, (word, len))| {
            let token_start = start_s + span * consumed as f64 / total as f64;
            consumed += len;
            let token_end = if i == last {
                end_s
            } else {
                start_s + span * consumed as f64 / total as f64
            };
            WordToken {
                word,
                start_s: token_start,
                end_s: token_end,
            }
        })
        .collect()
}
