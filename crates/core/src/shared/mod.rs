pub mod cefr_level;
pub mod constants;
pub mod engine_config;
pub mod error;
pub mod language;
