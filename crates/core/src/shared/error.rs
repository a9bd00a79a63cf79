use std::path::PathBuf;

use thiserror::Error;

use super::cefr_level::CefrLevel;
use crate::rubric::domain::scorer::TransportError;
use crate::transcript::domain::transcript::InputError;

/// Missing or invalid static configuration. Always a caller error: reported
/// immediately, never retried.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("no baseline profile configured for target level {0}")]
    MissingBaseline(CefrLevel),
    #[error("language '{0}' has no lexicon and no fallback lexicon is configured")]
    UnsupportedLanguage(String),
    #[error("'{0}' in configuration is not a CEFR level (expected A1..C2)")]
    UnknownLevel(String),
    #[error("language code '{0}' in configuration is not a supported language")]
    UnknownLanguageCode(String),
    #[error("invalid baseline profile for {level}: {reason}")]
    InvalidBaseline { level: CefrLevel, reason: String },
    #[error("invalid lexicon for '{language}': {reason}")]
    InvalidLexicon { language: String, reason: String },
    #[error("pause threshold must be a positive number of seconds, got {0}")]
    InvalidPauseThreshold(f64),
    #[error("failed to read configuration {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Errors the assessment pipeline surfaces to its caller.
///
/// Scoring-quality problems never appear here; they degrade the report
/// instead (unknown rubric levels, missing verdict, warnings).
#[derive(Error, Debug)]
pub enum AssessError {
    #[error("invalid transcript: {0}")]
    Input(#[from] InputError),
    #[error("scorer unavailable: {0}")]
    Transport(#[from] TransportError),
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
    #[error("assessment cancelled")]
    Cancelled,
}
