use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::shared::error::ConfigurationError;
use crate::transcript::domain::word_token::tokenize;

/// Word lists as they appear in configuration files.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LexiconEntry {
    pub fillers: Vec<String>,
    pub cohesion_markers: Vec<String>,
    pub complexity_triggers: Vec<String>,
}

/// A phrase occurrence on the token sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhraseMatch {
    pub start: usize,
    pub len: usize,
}

/// Tokenised phrases matched greedily, longest first, without overlap.
#[derive(Clone, Debug, PartialEq)]
pub struct PhraseSet {
    phrases: Vec<Vec<String>>,
}

impl PhraseSet {
    fn new(mut phrases: Vec<Vec<String>>) -> Self {
        phrases.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        phrases.dedup();
        Self { phrases }
    }

    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    pub fn find_matches(&self, words: &[String]) -> Vec<PhraseMatch> {
        let mut matches = Vec::new();
        let mut i = 0;
        while i < words.len() {
            match self.phrases.iter().find(|p| words[i..].starts_with(p)) {
                Some(phrase) => {
                    matches.push(PhraseMatch {
                        start: i,
                        len: phrase.len(),
                    });
                    i += phrase.len();
                }
                None => i += 1,
            }
        }
        matches
    }
}

/// Filler words, cohesion markers and complexity triggers for one language.
#[derive(Clone, Debug, PartialEq)]
pub struct Lexicon {
    fillers: BTreeSet<String>,
    cohesion_markers: PhraseSet,
    complexity_triggers: PhraseSet,
}

impl Lexicon {
    /// Builds from trusted static lists. Entries are tokenised the same way
    /// transcripts are, so `"Per quanto riguarda"` matches three tokens.
    pub fn from_static(fillers: &[&str], cohesion_markers: &[&str], complexity_triggers: &[&str]) -> Self {
        Self {
            fillers: fillers.iter().flat_map(|f| tokenize(f)).collect(),
            cohesion_markers: PhraseSet::new(phrases(cohesion_markers.iter().copied())),
            complexity_triggers: PhraseSet::new(phrases(complexity_triggers.iter().copied())),
        }
    }

    /// Builds from configuration, rejecting entries that are not usable.
    pub fn from_entry(language: &str, entry: &LexiconEntry) -> Result<Self, ConfigurationError> {
        let invalid = |reason: String| ConfigurationError::InvalidLexicon {
            language: language.to_string(),
            reason,
        };

        let mut fillers = BTreeSet::new();
        for f in &entry.fillers {
            match tokenize(f).as_slice() {
                [word] => {
                    fillers.insert(word.clone());
                }
                _ => return Err(invalid(format!("filler '{f}' must be exactly one word"))),
            }
        }
        for (kind, list) in [
            ("cohesion marker", &entry.cohesion_markers),
            ("complexity trigger", &entry.complexity_triggers),
        ] {
            if let Some(bad) = list.iter().find(|p| tokenize(p).is_empty()) {
                return Err(invalid(format!("{kind} '{bad}' contains no words")));
            }
        }

        Ok(Self {
            fillers,
            cohesion_markers: PhraseSet::new(phrases(entry.cohesion_markers.iter().map(String::as_str))),
            complexity_triggers: PhraseSet::new(phrases(
                entry.complexity_triggers.iter().map(String::as_str),
            )),
        })
    }

    pub fn is_filler(&self, word: &str) -> bool {
        self.fillers.contains(word)
    }

    pub fn cohesion_markers(&self) -> &PhraseSet {
        &self.cohesion_markers
    }

    pub fn complexity_triggers(&self) -> &PhraseSet {
        &self.complexity_triggers
    }
}

fn phrases<'a>(entries: impl Iterator<Item = &'a str>) -> Vec<Vec<String>> {
    entries.map(tokenize).filter(|p| !p.is_empty()).collect()
}
