use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::Serialize;

use super::pipeline_logger::PipelineLogger;
use crate::baseline::domain::baseline_comparator::compare;
use crate::baseline::domain::baseline_profile::BaselineTable;
use crate::history::domain::run_recorder::{RecorderError, RunRecorder};
use crate::history::domain::run_report::{RunId, RunMetadata, RunReport};
use crate::metrics::domain::metrics_extractor::MetricsExtractor;
use crate::rubric::domain::rubric_exchange::RubricExchange;
use crate::rubric::domain::scorer::Scorer;
use crate::shared::cefr_level::CefrLevel;
use crate::shared::error::AssessError;
use crate::transcript::domain::transcript::{InputError, Transcript};

/// Caller-supplied parameters of one assessment run.
#[derive(Debug, Clone, Default)]
pub struct AssessmentRequest {
    pub language: String,
    pub target_level: Option<CefrLevel>,
    pub input_id: String,
    pub label: String,
    pub notes: String,
    pub metadata: RunMetadata,
}

/// The report of a run plus what happened around it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssessmentOutcome {
    pub report: RunReport,
    /// Set when the structured record reached history.
    pub run_id: Option<RunId>,
    /// Recoverable problems: language fallback, unparseable rubric, history trouble.
    pub warnings: Vec<String>,
}

/// Runs one transcript through extraction, rubric exchange, baseline
/// comparison and recording, in that order.
///
/// Without a recorder the run has no side effects. Recording failures never
/// fail the run; they come back as warnings.
pub struct AssessSpeechUseCase {
    extractor: MetricsExtractor,
    exchange: RubricExchange,
    baselines: BaselineTable,
    scorer: Box<dyn Scorer>,
    recorder: Option<Box<dyn RunRecorder>>,
    cancelled: Arc<AtomicBool>,
}

impl AssessSpeechUseCase {
    pub fn new(
        extractor: MetricsExtractor,
        baselines: BaselineTable,
        scorer: Box<dyn Scorer>,
        recorder: Option<Box<dyn RunRecorder>>,
        cancelled: Option<Arc<AtomicBool>>,
    ) -> Self {
        Self {
            extractor,
            exchange: RubricExchange::new(),
            baselines,
            scorer,
            recorder,
            cancelled: cancelled.unwrap_or_else(|| Arc::new(AtomicBool::new(false))),
        }
    }

    pub fn run(
        &self,
        transcript: &Transcript,
        request: &AssessmentRequest,
        logger: &mut dyn PipelineLogger,
    ) -> Result<AssessmentOutcome, AssessError> {
        if transcript.is_empty() {
            return Err(InputError::Empty.into());
        }
        let mut warnings = Vec::new();

        // 1. Objective metrics
        self.check_cancelled()?;
        let started = Instant::now();
        let metrics = self.extractor.extract(transcript, &request.language)?;
        logger.timing("extract", elapsed_ms(started));
        logger.metric("word_count", metrics.word_count as f64);
        logger.metric("wpm", metrics.wpm);
        if metrics.language_fallback {
            warn(
                logger,
                &mut warnings,
                format!(
                    "no lexicon for language '{}', used '{}' instead",
                    request.language, metrics.language
                ),
            );
        }
        if metrics.degenerate {
            warn(logger, &mut warnings, "transcript has no measurable speech; rates are zero".to_string());
        }

        // 2. Fail fast on a missing baseline
        if let Some(level) = request.target_level {
            self.baselines.get(level)?;
        }

        // 3. Rubric from the external scorer
        self.check_cancelled()?;
        let started = Instant::now();
        let rubric = self
            .exchange
            .request_rubric(&transcript.text(), &metrics, self.scorer.as_ref())?;
        logger.timing("score", elapsed_ms(started));
        if rubric.is_fully_unknown() {
            warn(logger, &mut warnings, "scorer response could not be parsed; rubric levels are unknown".to_string());
        }

        // 4. Baseline verdict
        let verdict = compare(&metrics, &rubric, request.target_level, &self.baselines)?;
        if let Some(v) = &verdict {
            logger.info(&format!(
                "Verdict for {}: {}",
                v.target_level,
                if v.overall_pass { "pass" } else { "fail" }
            ));
        }

        let report = RunReport {
            timestamp: Utc::now(),
            input_id: request.input_id.clone(),
            metrics,
            rubric,
            verdict,
            label: request.label.clone(),
            notes: request.notes.clone(),
            metadata: request.metadata.clone(),
        };

        // 5. History
        self.check_cancelled()?;
        let run_id = match &self.recorder {
            None => None,
            Some(recorder) => {
                let started = Instant::now();
                let result = recorder.append(&report);
                logger.timing("record", elapsed_ms(started));
                match result {
                    Ok(id) => {
                        logger.info(&format!("Recorded run {id}"));
                        Some(id)
                    }
                    Err(RecorderError::PartialWrite { run_id, path, source }) => {
                        warn(
                            logger,
                            &mut warnings,
                            format!(
                                "run {run_id} recorded without its tabular row ({}: {source}); run --repair-history",
                                path.display()
                            ),
                        );
                        Some(run_id)
                    }
                    Err(e) => {
                        warn(logger, &mut warnings, format!("run not recorded: {e}"));
                        None
                    }
                }
            }
        };

        Ok(AssessmentOutcome {
            report,
            run_id,
            warnings,
        })
    }

    fn check_cancelled(&self) -> Result<(), AssessError> {
        if self.cancelled.load(Ordering::Relaxed) {
            return Err(AssessError::Cancelled);
        }
        Ok(())
    }
}

fn warn(logger: &mut dyn PipelineLogger, warnings: &mut Vec<String>, message: String) {
    logger.warn(&message);
    warnings.push(message);
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}
