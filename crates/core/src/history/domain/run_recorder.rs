use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use super::run_report::{RecordedRun, RunId, RunReport};

#[derive(Error, Debug)]
pub enum RecorderError {
    #[error("failed to create history directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize run report: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to encode history row: {0}")]
    Tabular(#[from] csv::Error),
    /// The structured record of `run_id` is stored but its tabular row is not.
    #[error("run {run_id} partially recorded, tabular row missing in {path}: {source}")]
    PartialWrite {
        run_id: RunId,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A run present in one history store but not the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inconsistency {
    MissingTabularRow(RunId),
    MissingStructuredRecord(RunId),
}

impl fmt::Display for Inconsistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Inconsistency::MissingTabularRow(id) => write!(f, "run {id} has no tabular history row"),
            Inconsistency::MissingStructuredRecord(id) => {
                write!(f, "tabular row for run {id} has no structured record")
            }
        }
    }
}

/// Everything that could be read back from history.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryReadout {
    /// Oldest first.
    pub runs: Vec<RecordedRun>,
    /// Malformed entries after the last well-formed one (torn final writes).
    pub discarded_trailing: usize,
    /// Malformed entries followed by well-formed ones.
    pub discarded_interior: usize,
    /// Tabular rows that are torn or do not have every column.
    pub discarded_tabular: usize,
    pub inconsistencies: Vec<Inconsistency>,
}

impl HistoryReadout {
    pub fn reports(&self) -> impl Iterator<Item = &RunReport> {
        self.runs.iter().map(|r| &r.report)
    }

    pub fn is_clean(&self) -> bool {
        self.discarded_trailing == 0
            && self.discarded_interior == 0
            && self.discarded_tabular == 0
            && self.inconsistencies.is_empty()
    }
}

/// Domain interface for append-only run history.
pub trait RunRecorder: Send + Sync {
    /// Stores `report` under a fresh run id.
    fn append(&self, report: &RunReport) -> Result<RunId, RecorderError>;

    fn read_history(&self) -> Result<HistoryReadout, RecorderError>;
}
