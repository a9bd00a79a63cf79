use super::language::Language;

/// Minimum silence between consecutive words that counts as a pause.
pub const DEFAULT_PAUSE_THRESHOLD_S: f64 = 0.300;

/// Float slack applied when comparing gaps against the pause threshold.
pub const PAUSE_TOLERANCE_S: f64 = 1e-9;

/// Float slack allowed when native word timings touch their segment's bounds.
pub const TIMESTAMP_TOLERANCE_S: f64 = 1e-9;

pub const DEFAULT_FALLBACK_LANGUAGE: Language = Language::Italian;

pub const DEFAULT_SCORER_MODEL: &str = "llama3.1";
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_SCORER_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_TRANSCRIBER_MODEL: &str = "large-v3";

pub const HISTORY_JSONL_FILENAME: &str = "history.jsonl";
pub const HISTORY_CSV_FILENAME: &str = "history.csv";
pub const APP_DIR_NAME: &str = "CEFR Assess";
