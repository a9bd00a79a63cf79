use std::collections::BTreeMap;
use std::time::Instant;

/// Cross-cutting logger for assessment pipeline events.
///
/// Keeps the use case independent of how stage timings and warnings are
/// surfaced (log crate, CLI summary, nothing at all).
pub trait PipelineLogger: Send {
    /// Record how long a named pipeline stage took.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a point-in-time metric (e.g. word count, scorer attempts).
    fn metric(&mut self, name: &str, value: f64);

    fn info(&mut self, message: &str);

    /// A recoverable problem the caller should know about.
    fn warn(&mut self, message: &str);

    /// Emit an end-of-pipeline summary. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger that discards all events. Used by tests and the self-test.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
    fn warn(&mut self, _message: &str) {}
}

/// Logger that forwards messages to the `log` crate and keeps per-stage
/// timings for a summary at the end of the run.
pub struct LogPipelineLogger {
    timings: BTreeMap<String, Vec<f64>>,
    metrics: BTreeMap<String, f64>,
    start_time: Instant,
    warnings: Vec<String>,
}

impl LogPipelineLogger {
    pub fn new() -> Self {
        Self {
            timings: BTreeMap::new(),
            metrics: BTreeMap::new(),
            start_time: Instant::now(),
            warnings: Vec::new(),
        }
    }

    /// Returns the formatted summary string, or `None` if no data recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let mut lines = vec![format!("Assessment summary ({:.1}s total):", elapsed_ms / 1000.0)];

        for (stage, durations) in &self.timings {
            let total_ms: f64 = durations.iter().sum();
            let pct = if elapsed_ms > 0.0 {
                total_ms / elapsed_ms * 100.0
            } else {
                0.0
            };
            lines.push(format!("  {stage:12}: {total_ms:8.1}ms  ({pct:4.1}%)"));
        }
        for (name, value) in &self.metrics {
            lines.push(format!("  {name}: {value:.2}"));
        }
        if !self.warnings.is_empty() {
            lines.push(format!("  warnings: {}", self.warnings.len()));
        }

        Some(lines.join("\n"))
    }

    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }

    pub fn metric_value(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

impl Default for LogPipelineLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineLogger for LogPipelineLogger {
    fn timing(&mut self, stage: &str, duration_ms: f64) {
        log::debug!("{stage} took {duration_ms:.1}ms");
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics.insert(name.to_string(), value);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn warn(&mut self, message: &str) {
        self.warnings.push(message.to_string());
        log::warn!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_null_logger_all_methods_are_noop() {
        let mut logger = NullPipelineLogger;
        logger.timing("extract", 5.0);
        logger.metric("word_count", 3.0);
        logger.info("hello");
        logger.warn("careful");
        logger.summary();
    }

    #[test]
    fn test_timing_records_values() {
        let mut logger = LogPipelineLogger::new();
        logger.timing("score", 20.0);
        logger.timing("score", 30.0);
        logger.timing("extract", 5.0);

        assert_eq!(logger.timings_for("score").unwrap(), &[20.0, 30.0]);
        assert_eq!(logger.timings_for("extract").unwrap(), &[5.0]);
        assert!(logger.timings_for("record").is_none());
    }

    #[test]
    fn test_metric_keeps_latest_value() {
        let mut logger = LogPipelineLogger::new();
        logger.metric("wpm", 110.0);
        logger.metric("wpm", 120.5);
        assert_relative_eq!(logger.metric_value("wpm").unwrap(), 120.5);
    }

    #[test]
    fn test_summary_lists_stages_and_metrics() {
        let mut logger = LogPipelineLogger::new();
        logger.timing("extract", 2.0);
        logger.timing("score", 900.0);
        logger.metric("wpm", 120.0);
        logger.warn("scorer retried");

        let summary = logger.summary_string().unwrap();
        assert!(summary.contains("Assessment summary"));
        assert!(summary.contains("extract"));
        assert!(summary.contains("score"));
        assert!(summary.contains("wpm: 120.00"));
        assert!(summary.contains("warnings: 1"));
    }

    #[test]
    fn test_empty_summary_returns_none() {
        assert!(LogPipelineLogger::new().summary_string().is_none());
    }

    #[test]
    fn test_warn_keeps_message() {
        let mut logger = LogPipelineLogger::default();
        logger.warn("history partially written");
        assert_eq!(logger.warnings(), &["history partially written".to_string()]);
    }
}
