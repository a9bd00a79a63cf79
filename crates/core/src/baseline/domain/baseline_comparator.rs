use std::collections::BTreeMap;

use super::baseline_profile::{BaselineProfile, BaselineTable};
use super::verdict::{DimensionVerdict, Expectation, MetricDimension, VerdictRecord};
use crate::metrics::domain::metrics_record::MetricsRecord;
use crate::rubric::domain::rubric_record::RubricRecord;
use crate::shared::cefr_level::CefrLevel;
use crate::shared::error::ConfigurationError;

/// Compares a run against the baseline for `target_level`.
///
/// Returns `Ok(None)` without a target. Overall pass needs every metric
/// dimension within its baseline and a rubric overall level at or above the
/// target; an `unknown` rubric level never passes.
pub fn compare(
    metrics: &MetricsRecord,
    rubric: &RubricRecord,
    target_level: Option<CefrLevel>,
    baselines: &BaselineTable,
) -> Result<Option<VerdictRecord>, ConfigurationError> {
    let Some(target_level) = target_level else {
        return Ok(None);
    };
    let profile = baselines.get(target_level)?;

    let per_dimension: BTreeMap<MetricDimension, DimensionVerdict> = MetricDimension::ALL
        .iter()
        .map(|&dimension| {
            let verdict = DimensionVerdict::evaluate(
                observed(metrics, dimension),
                expectation(profile, dimension),
            );
            (dimension, verdict)
        })
        .collect();

    let rubric_level_pass = rubric.overall_level.meets(target_level);
    let overall_pass = rubric_level_pass && per_dimension.values().all(|v| v.pass);

    Ok(Some(VerdictRecord {
        target_level,
        per_dimension,
        rubric_level_pass,
        overall_pass,
    }))
}

fn observed(metrics: &MetricsRecord, dimension: MetricDimension) -> f64 {
    match dimension {
        MetricDimension::Wpm => metrics.wpm,
        MetricDimension::FillerRate => metrics.filler_rate,
        MetricDimension::ComplexityIndex => metrics.complexity_index,
        MetricDimension::PauseRate => metrics.pause_rate,
    }
}

fn expectation(profile: &BaselineProfile, dimension: MetricDimension) -> Expectation {
    match dimension {
        MetricDimension::Wpm => Expectation::Range {
            min: profile.wpm_range.0,
            max: profile.wpm_range.1,
        },
        MetricDimension::FillerRate => Expectation::AtMost {
            max: profile.filler_rate_max,
        },
        MetricDimension::ComplexityIndex => Expectation::AtLeast {
            min: profile.complexity_index_min,
        },
        MetricDimension::PauseRate => Expectation::AtMost {
            max: profile.pause_rate_max,
        },
    }
}
