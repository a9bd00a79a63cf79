use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::shared::cefr_level::CefrLevel;

/// Objective metric dimensions compared against a baseline profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricDimension {
    Wpm,
    FillerRate,
    ComplexityIndex,
    PauseRate,
}

impl MetricDimension {
    pub const ALL: &[MetricDimension] = &[
        MetricDimension::Wpm,
        MetricDimension::FillerRate,
        MetricDimension::ComplexityIndex,
        MetricDimension::PauseRate,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            MetricDimension::Wpm => "wpm",
            MetricDimension::FillerRate => "filler_rate",
            MetricDimension::ComplexityIndex => "complexity_index",
            MetricDimension::PauseRate => "pause_rate",
        }
    }
}

impl fmt::Display for MetricDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// What a baseline expects of one dimension. Bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expectation {
    Range { min: f64, max: f64 },
    AtMost { max: f64 },
    AtLeast { min: f64 },
}

impl Expectation {
    pub fn admits(&self, observed: f64) -> bool {
        match *self {
            Expectation::Range { min, max } => observed >= min && observed <= max,
            Expectation::AtMost { max } => observed <= max,
            Expectation::AtLeast { min } => observed >= min,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DimensionVerdict {
    pub observed: f64,
    pub expected: Expectation,
    pub pass: bool,
}

impl DimensionVerdict {
    pub fn evaluate(observed: f64, expected: Expectation) -> Self {
        Self {
            observed,
            expected,
            pass: expected.admits(observed),
        }
    }
}

/// Outcome of comparing one run against the baseline for a target level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerdictRecord {
    pub target_level: CefrLevel,
    pub per_dimension: BTreeMap<MetricDimension, DimensionVerdict>,
    /// Rubric overall level is at or above the target.
    pub rubric_level_pass: bool,
    pub overall_pass: bool,
}

impl VerdictRecord {
    pub fn failed_dimensions(&self) -> Vec<MetricDimension> {
        self.per_dimension
            .iter()
            .filter(|(_, v)| !v.pass)
            .map(|(d, _)| *d)
            .collect()
    }
}
