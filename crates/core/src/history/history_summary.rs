use super::domain::run_recorder::HistoryReadout;
use super::domain::run_report::RecordedRun;
use crate::shared::cefr_level::CefrLevel;

/// Aggregate view over recorded runs.
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySummary {
    pub run_count: usize,
    /// Mean wpm over non-degenerate runs.
    pub average_wpm: Option<f64>,
    pub best_overall: Option<CefrLevel>,
    /// Runs with a verdict, and how many of them passed.
    pub verdict_count: usize,
    pub pass_count: usize,
    pub latest: Option<RecordedRun>,
}

impl HistorySummary {
    /// `runs` must be oldest first, as returned by `read_history`.
    pub fn from_runs(runs: &[RecordedRun]) -> Self {
        let wpm: Vec<f64> = runs
            .iter()
            .filter(|r| !r.report.metrics.degenerate)
            .map(|r| r.report.metrics.wpm)
            .collect();
        let average_wpm = (!wpm.is_empty()).then(|| wpm.iter().sum::<f64>() / wpm.len() as f64);
        let best_overall = runs.iter().filter_map(|r| r.report.rubric.overall_level.level()).max();
        let verdicts: Vec<bool> = runs
            .iter()
            .filter_map(|r| r.report.verdict.as_ref().map(|v| v.overall_pass))
            .collect();

        Self {
            run_count: runs.len(),
            average_wpm,
            best_overall,
            verdict_count: verdicts.len(),
            pass_count: verdicts.iter().filter(|&&p| p).count(),
            latest: runs.last().cloned(),
        }
    }
}

/// Plain-text history: one summary line, then one row per run.
pub fn render_history(readout: &HistoryReadout) -> String {
    let summary = HistorySummary::from_runs(&readout.runs);
    let mut out = String::new();
    if summary.run_count == 0 {
        out.push_str("No recorded runs.\n");
        return out;
    }

    let mut meta = vec![format!("Runs: {}", summary.run_count)];
    if let Some(wpm) = summary.average_wpm {
        meta.push(format!("Avg WPM: {wpm:.1}"));
    }
    if let Some(best) = summary.best_overall {
        meta.push(format!("Best overall: {best}"));
    }
    if summary.verdict_count > 0 {
        meta.push(format!("Passed: {}/{}", summary.pass_count, summary.verdict_count));
    }
    out.push_str(&format!("{}\n\n", meta.join(" | ")));

    out.push_str(&format!(
        "{:>3}  {:<16}  {:<20}  {:<24}  {:>6}  {:<7}  {:<6}  {:<4}\n",
        "#", "Date", "Label", "Input", "WPM", "Overall", "Target", "Pass"
    ));
    for (i, run) in readout.runs.iter().enumerate() {
        let report = &run.report;
        let (target, pass) = match &report.verdict {
            Some(v) => (v.target_level.to_string(), if v.overall_pass { "yes" } else { "no" }),
            None => ("-".to_string(), "-"),
        };
        out.push_str(&format!(
            "{:>3}  {:<16}  {:<20}  {:<24}  {:>6.1}  {:<7}  {:<6}  {:<4}\n",
            i + 1,
            report.timestamp.format("%Y-%m-%d %H:%M").to_string(),
            truncate(&report.label, 20),
            truncate(&report.input_id, 24),
            report.metrics.wpm,
            String::from(report.rubric.overall_level),
            target,
            pass,
        ));
    }

    if !readout.is_clean() {
        out.push_str(&format!(
            "\n{} malformed entries skipped, {} inconsistencies (run with --repair-history to restore missing rows)\n",
            readout.discarded_trailing + readout.discarded_interior + readout.discarded_tabular,
            readout.inconsistencies.len()
        ));
    }
    out
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}
