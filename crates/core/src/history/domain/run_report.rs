use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::baseline::domain::verdict::VerdictRecord;
use crate::metrics::domain::metrics_record::MetricsRecord;
use crate::rubric::domain::rubric_record::RubricRecord;

/// Identifier shared by a run's structured record and its tabular row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RunId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// Which models produced the run. Labels only; the engine does not interpret them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub scorer_model: String,
    pub transcriber_model: String,
}

/// Everything known about one assessment run. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub timestamp: DateTime<Utc>,
    pub input_id: String,
    pub metrics: MetricsRecord,
    pub rubric: RubricRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verdict: Option<VerdictRecord>,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub metadata: RunMetadata,
}

/// A report as stored in history, keyed by its run id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedRun {
    pub run_id: RunId,
    pub report: RunReport,
}

#[cfg(test)]
pub(crate) fn sample_report(
    input_id: &str,
    wpm: f64,
    overall: crate::shared::cefr_level::LevelAssessment,
    timestamp: DateTime<Utc>,
) -> RunReport {
    let metrics = MetricsRecord {
        duration_s: 61.7,
        speaking_time_s: 55.3,
        word_count: (wpm * 61.7 / 60.0).round() as usize,
        wpm,
        pause_count: 7,
        pause_total_s: 6.4,
        pause_rate: 7.0 / (61.7 / 60.0),
        filler_count: 3,
        filler_rate: 0.1 / 3.0,
        cohesion_marker_count: 4,
        complexity_trigger_count: 5,
        sentence_count: 6,
        complexity_index: 5.0 / 6.0,
        degenerate: false,
        ..MetricsRecord::empty("it", false)
    };
    RunReport {
        timestamp,
        input_id: input_id.to_string(),
        metrics,
        rubric: RubricRecord {
            overall_level: overall,
            rationale: "Fluent, with \"quoted\" words, commas, and\nnewlines.".to_string(),
            ..RubricRecord::unknown("{\"overall\": \"B2\"}")
        },
        verdict: None,
        label: "weekly, practice".to_string(),
        notes: "città; \"note\"".to_string(),
        metadata: RunMetadata {
            scorer_model: "llama3.1".to_string(),
            transcriber_model: "large-v3".to_string(),
        },
    }
}
