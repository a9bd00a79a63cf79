//! Speaking-assessment engine: objective speech metrics from a timed
//! transcript, a CEFR rubric from an external scoring model, a verdict
//! against per-level baselines, and an append-only run history.

pub mod baseline;
pub mod history;
pub mod lexicon;
pub mod metrics;
pub mod pipeline;
pub mod rubric;
pub mod shared;
pub mod transcript;
