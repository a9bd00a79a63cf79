use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::cefr_level::CefrLevel;
use super::constants::{APP_DIR_NAME, DEFAULT_FALLBACK_LANGUAGE, DEFAULT_PAUSE_THRESHOLD_S};
use super::error::ConfigurationError;
use super::language::Language;
use crate::baseline::domain::baseline_profile::{BaselineProfile, BaselineTable};
use crate::lexicon::domain::builtin_lexicons::builtin_lexicon;
use crate::lexicon::domain::lexicon::{Lexicon, LexiconEntry};
use crate::lexicon::domain::lexicon_store::LexiconStore;
use crate::metrics::domain::metrics_extractor::MetricsExtractor;

/// `fallback_language` value that disables the fallback lexicon.
pub const NO_FALLBACK: &str = "none";

/// Optional overrides of the compiled-in tables, read from a TOML file.
///
/// ```toml
/// pause_threshold_s = 0.25
/// fallback_language = "en"
///
/// [baselines.B1]
/// wpm_range = [85.0, 150.0]
/// filler_rate_max = 0.08
/// complexity_index_min = 0.3
/// pause_rate_max = 18.0
///
/// [lexicons.en]
/// fillers = ["um", "uh"]
/// cohesion_markers = ["however"]
/// complexity_triggers = ["which", "if"]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub pause_threshold_s: f64,
    pub fallback_language: String,
    pub baselines: BTreeMap<String, BaselineProfile>,
    pub lexicons: BTreeMap<String, LexiconEntry>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pause_threshold_s: DEFAULT_PAUSE_THRESHOLD_S,
            fallback_language: DEFAULT_FALLBACK_LANGUAGE.code().to_string(),
            baselines: BTreeMap::new(),
            lexicons: BTreeMap::new(),
        }
    }
}

impl EngineConfig {
    /// Reads and validates a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigurationError> {
        let text = fs::read_to_string(path).map_err(|e| ConfigurationError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config = Self::parse(&text, path)?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn parse(text: &str, path: &Path) -> Result<Self, ConfigurationError> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigurationError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every override so that later lookups cannot fail on bad data.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !self.pause_threshold_s.is_finite() || self.pause_threshold_s <= 0.0 {
            return Err(ConfigurationError::InvalidPauseThreshold(self.pause_threshold_s));
        }
        self.lexicon_store()?;
        self.baseline_table()?;
        Ok(())
    }

    pub fn fallback_language(&self) -> Result<Option<Language>, ConfigurationError> {
        let code = self.fallback_language.trim();
        if code.eq_ignore_ascii_case(NO_FALLBACK) {
            return Ok(None);
        }
        Language::from_code(code)
            .map(Some)
            .ok_or_else(|| ConfigurationError::UnknownLanguageCode(code.to_string()))
    }

    /// Built-in lexicons with configured languages replaced wholesale.
    pub fn lexicon_store(&self) -> Result<LexiconStore, ConfigurationError> {
        let mut lexicons: BTreeMap<Language, Lexicon> = Language::ALL
            .iter()
            .map(|&lang| (lang, builtin_lexicon(lang)))
            .collect();
        for (code, entry) in &self.lexicons {
            let language = Language::from_code(code)
                .ok_or_else(|| ConfigurationError::UnknownLanguageCode(code.clone()))?;
            lexicons.insert(language, Lexicon::from_entry(code, entry)?);
        }
        LexiconStore::new(lexicons, self.fallback_language()?)
    }

    pub fn baseline_table(&self) -> Result<BaselineTable, ConfigurationError> {
        let mut overrides = BTreeMap::new();
        for (label, profile) in &self.baselines {
            let level: CefrLevel = label
                .parse()
                .map_err(|_| ConfigurationError::UnknownLevel(label.clone()))?;
            overrides.insert(level, *profile);
        }
        BaselineTable::builtin().with_overrides(&overrides)
    }

    pub fn metrics_extractor(&self) -> Result<MetricsExtractor, ConfigurationError> {
        Ok(MetricsExtractor::new(self.lexicon_store()?, self.pause_threshold_s))
    }
}

/// Platform-specific default history directory.
///
/// - Linux: `$XDG_DATA_HOME/CEFR Assess/history/` or `~/.local/share/CEFR Assess/history/`
/// - macOS: `~/Library/Application Support/CEFR Assess/history/`
/// - Windows: `%LOCALAPPDATA%/CEFR Assess/history/`
pub fn default_log_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join(APP_DIR_NAME).join("history"))
}
