use std::collections::BTreeMap;

use super::builtin_lexicons::builtin_lexicon;
use super::lexicon::Lexicon;
use crate::shared::constants::DEFAULT_FALLBACK_LANGUAGE;
use crate::shared::error::ConfigurationError;
use crate::shared::language::Language;

/// The lexicon chosen for a requested language code.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedLexicon<'a> {
    pub lexicon: &'a Lexicon,
    pub language: Language,
    /// True when the requested code had no lexicon and the fallback was used.
    pub fallback: bool,
}

/// Process-wide read-only lexicon table keyed by language.
#[derive(Clone, Debug)]
pub struct LexiconStore {
    lexicons: BTreeMap<Language, Lexicon>,
    fallback: Option<Language>,
}

impl LexiconStore {
    pub fn new(
        lexicons: BTreeMap<Language, Lexicon>,
        fallback: Option<Language>,
    ) -> Result<Self, ConfigurationError> {
        if let Some(lang) = fallback {
            if !lexicons.contains_key(&lang) {
                return Err(ConfigurationError::InvalidLexicon {
                    language: lang.code().to_string(),
                    reason: "fallback language has no lexicon".to_string(),
                });
            }
        }
        Ok(Self { lexicons, fallback })
    }

    /// Every supported language with its built-in lexicon, falling back to
    /// the default language.
    pub fn builtin() -> Self {
        let lexicons = Language::ALL
            .iter()
            .map(|&lang| (lang, builtin_lexicon(lang)))
            .collect();
        Self {
            lexicons,
            fallback: Some(DEFAULT_FALLBACK_LANGUAGE),
        }
    }

    pub fn fallback(&self) -> Option<Language> {
        self.fallback
    }

    pub fn resolve(&self, code: &str) -> Result<ResolvedLexicon<'_>, ConfigurationError> {
        if let Some(language) = Language::from_code(code) {
            if let Some(lexicon) = self.lexicons.get(&language) {
                return Ok(ResolvedLexicon {
                    lexicon,
                    language,
                    fallback: false,
                });
            }
        }

        let fallback = self
            .fallback
            .and_then(|lang| self.lexicons.get(&lang).map(|lex| (lang, lex)));
        match fallback {
            Some((language, lexicon)) => {
                log::warn!("No lexicon for language '{code}', falling back to '{language}'");
                Ok(ResolvedLexicon {
                    lexicon,
                    language,
                    fallback: true,
                })
            }
            None => Err(ConfigurationError::UnsupportedLanguage(code.to_string())),
        }
    }
}

impl Default for LexiconStore {
    fn default() -> Self {
        Self::builtin()
    }
}
