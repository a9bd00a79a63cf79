use std::collections::BTreeSet;
use std::fs::{self, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::history::domain::run_recorder::{HistoryReadout, Inconsistency, RecorderError, RunRecorder};
use crate::history::domain::run_report::{RecordedRun, RunId, RunReport};
use crate::shared::constants::{HISTORY_CSV_FILENAME, HISTORY_JSONL_FILENAME};

const RUN_ID_COLUMN: &str = "run_id";
const TABULAR_COLUMN_COUNT: usize = 17;

/// Flattened history row, fields in column order. Always one physical line.
#[derive(Debug, Serialize, Deserialize)]
struct TabularRow {
    run_id: RunId,
    timestamp: String,
    input_id: String,
    language: String,
    duration_s: f64,
    word_count: usize,
    wpm: f64,
    pause_count: usize,
    filler_rate: f64,
    complexity_index: f64,
    overall_level: String,
    target_level: Option<String>,
    overall_pass: Option<bool>,
    label: String,
    notes: String,
    scorer_model: String,
    transcriber_model: String,
}

impl TabularRow {
    fn new(run_id: RunId, report: &RunReport) -> Self {
        Self {
            run_id,
            timestamp: report.timestamp.to_rfc3339(),
            input_id: single_line(&report.input_id),
            language: single_line(&report.metrics.language),
            duration_s: report.metrics.duration_s,
            word_count: report.metrics.word_count,
            wpm: report.metrics.wpm,
            pause_count: report.metrics.pause_count,
            filler_rate: report.metrics.filler_rate,
            complexity_index: report.metrics.complexity_index,
            overall_level: report.rubric.overall_level.into(),
            target_level: report.verdict.as_ref().map(|v| v.target_level.to_string()),
            overall_pass: report.verdict.as_ref().map(|v| v.overall_pass),
            label: single_line(&report.label),
            notes: single_line(&report.notes),
            scorer_model: single_line(&report.metadata.scorer_model),
            transcriber_model: single_line(&report.metadata.transcriber_model),
        }
    }

    /// Parses one physical line. `Ok(None)` is a header line; `Err` is a
    /// torn row, a row with missing columns or one with unreadable values.
    fn parse_line(line: &[u8]) -> Result<Option<RunId>, String> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(line);
        let mut record = csv::ByteRecord::new();
        if !reader.read_byte_record(&mut record).map_err(|e| e.to_string())? {
            return Err("empty row".to_string());
        }
        if record.len() != TABULAR_COLUMN_COUNT {
            return Err(format!("{} of {TABULAR_COLUMN_COUNT} columns", record.len()));
        }
        if record.get(0) == Some(RUN_ID_COLUMN.as_bytes()) {
            return Ok(None);
        }
        let row: TabularRow = record.deserialize(None).map_err(|e| e.to_string())?;
        chrono::DateTime::parse_from_rfc3339(&row.timestamp).map_err(|e| e.to_string())?;
        Ok(Some(row.run_id))
    }
}

/// The structured record keeps the original text; the tabular copy folds
/// line breaks so every row stays on its own line.
fn single_line(text: &str) -> String {
    text.replace(|c: char| c == '\r' || c == '\n', " ")
}

#[derive(Serialize)]
struct StoredRun<'a> {
    run_id: RunId,
    report: &'a RunReport,
}

/// Run history kept as two append-only files in one directory:
/// `history.jsonl` (one complete record per line) and `history.csv`
/// (one flattened row per run).
///
/// Every record is written with a single `write_all` on a file opened in
/// append mode, so concurrent writers interleave only at line boundaries.
pub struct FileRunRecorder {
    dir: PathBuf,
}

impl FileRunRecorder {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn structured_path(&self) -> PathBuf {
        self.dir.join(HISTORY_JSONL_FILENAME)
    }

    pub fn tabular_path(&self) -> PathBuf {
        self.dir.join(HISTORY_CSV_FILENAME)
    }

    /// Appends tabular rows for runs that only have a structured record.
    /// Returns how many rows were written; running it again writes none.
    pub fn repair_tabular(&self) -> Result<usize, RecorderError> {
        let readout = self.read_history()?;
        let mut repaired = 0;
        for inconsistency in &readout.inconsistencies {
            let Inconsistency::MissingTabularRow(run_id) = inconsistency else {
                continue;
            };
            let Some(run) = readout.runs.iter().find(|r| r.run_id == *run_id) else {
                continue;
            };
            let path = self.tabular_path();
            let bytes = self.tabular_bytes(run.run_id, &run.report)?;
            append_record(&path, &bytes).map_err(|e| RecorderError::Write { path, source: e })?;
            log::info!("Restored tabular history row for run {run_id}");
            repaired += 1;
        }
        Ok(repaired)
    }

    fn tabular_bytes(&self, run_id: RunId, report: &RunReport) -> Result<Vec<u8>, RecorderError> {
        let needs_header = fs::metadata(self.tabular_path())
            .map(|m| m.len() == 0)
            .unwrap_or(true);
        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(Vec::new());
        writer.serialize(TabularRow::new(run_id, report))?;
        writer
            .into_inner()
            .map_err(|e| RecorderError::Tabular(csv::Error::from(e.into_error())))
    }

    fn read_structured(&self) -> Result<(Vec<RecordedRun>, usize, usize), RecorderError> {
        let path = self.structured_path();
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok((Vec::new(), 0, 0)),
            Err(e) => return Err(RecorderError::Read { path, source: e }),
        };

        let mut runs = Vec::new();
        let mut malformed_since_last_good = 0;
        let mut interior = 0;
        for line in bytes.split(|&b| b == b'\n') {
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            match serde_json::from_slice::<RecordedRun>(line) {
                Ok(run) => {
                    interior += malformed_since_last_good;
                    malformed_since_last_good = 0;
                    runs.push(run);
                }
                Err(e) => {
                    log::debug!("Skipping malformed history entry: {e}");
                    malformed_since_last_good += 1;
                }
            }
        }
        Ok((runs, malformed_since_last_good, interior))
    }

    /// Run ids of well-formed tabular rows in file order, and how many
    /// lines were discarded. Lines are read one at a time so a row torn
    /// inside a quoted field cannot swallow the row after it.
    fn read_tabular_ids(&self) -> Result<(Vec<RunId>, usize), RecorderError> {
        let path = self.tabular_path();
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok((Vec::new(), 0)),
            Err(e) => return Err(RecorderError::Read { path, source: e }),
        };

        let mut ids = Vec::new();
        let mut discarded = 0;
        for line in bytes.split(|&b| b == b'\n') {
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            match TabularRow::parse_line(line) {
                Ok(Some(run_id)) => ids.push(run_id),
                Ok(None) => {}
                Err(reason) => {
                    log::debug!("Skipping malformed tabular history row: {reason}");
                    discarded += 1;
                }
            }
        }
        Ok((ids, discarded))
    }
}

impl RunRecorder for FileRunRecorder {
    fn append(&self, report: &RunReport) -> Result<RunId, RecorderError> {
        fs::create_dir_all(&self.dir).map_err(|e| RecorderError::CreateDir {
            path: self.dir.clone(),
            source: e,
        })?;

        let run_id = RunId::new();
        let mut line = serde_json::to_vec(&StoredRun { run_id, report })?;
        line.push(b'\n');
        let row = self.tabular_bytes(run_id, report)?;

        let structured = self.structured_path();
        append_record(&structured, &line).map_err(|e| RecorderError::Write {
            path: structured,
            source: e,
        })?;

        let tabular = self.tabular_path();
        append_record(&tabular, &row).map_err(|e| RecorderError::PartialWrite {
            run_id,
            path: tabular,
            source: e,
        })?;

        log::debug!("Recorded run {run_id} in {}", self.dir.display());
        Ok(run_id)
    }

    fn read_history(&self) -> Result<HistoryReadout, RecorderError> {
        let (mut runs, discarded_trailing, discarded_interior) = self.read_structured()?;
        let (tabular_ids, discarded_tabular) = self.read_tabular_ids()?;

        let structured_set: BTreeSet<RunId> = runs.iter().map(|r| r.run_id).collect();
        let tabular_set: BTreeSet<RunId> = tabular_ids.iter().copied().collect();
        let mut inconsistencies: Vec<Inconsistency> = runs
            .iter()
            .filter(|r| !tabular_set.contains(&r.run_id))
            .map(|r| Inconsistency::MissingTabularRow(r.run_id))
            .collect();
        let mut reported = BTreeSet::new();
        for id in tabular_ids {
            if !structured_set.contains(&id) && reported.insert(id) {
                inconsistencies.push(Inconsistency::MissingStructuredRecord(id));
            }
        }

        if discarded_trailing + discarded_interior > 0 {
            log::warn!(
                "Discarded {discarded_trailing} trailing and {discarded_interior} interior malformed history entries"
            );
        }
        if discarded_tabular > 0 {
            log::warn!("Discarded {discarded_tabular} malformed tabular history rows");
        }
        for inconsistency in &inconsistencies {
            log::warn!("History inconsistency: {inconsistency}");
        }

        runs.sort_by_key(|r| r.report.timestamp);
        Ok(HistoryReadout {
            runs,
            discarded_trailing,
            discarded_interior,
            discarded_tabular,
            inconsistencies,
        })
    }
}

/// Appends `record` with one write. A file left without a final newline by
/// an interrupted writer gets one first, so the torn line stays separate.
fn append_record(path: &Path, record: &[u8]) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .read(true)
        .open(path)?;

    let mut buf = Vec::with_capacity(record.len() + 1);
    if file.metadata()?.len() > 0 {
        let mut last = [0u8; 1];
        file.seek(SeekFrom::End(-1))?;
        file.read_exact(&mut last)?;
        if last[0] != b'\n' {
            buf.push(b'\n');
        }
    }
    buf.extend_from_slice(record);
    file.write_all(&buf)?;
    file.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::baseline::domain::verdict::VerdictRecord;
    use crate::history::domain::run_report::sample_report;
    use crate::shared::cefr_level::{CefrLevel, LevelAssessment};
    use chrono::{Duration, TimeZone, Utc};
    use std::collections::BTreeMap;

    fn report(i: i64) -> RunReport {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        sample_report(
            &format!("take-{i}.wav"),
            100.0 + i as f64 / 3.0,
            LevelAssessment::Level(CefrLevel::B1),
            start + Duration::seconds(i) + Duration::nanoseconds(123_456_789),
        )
    }

    #[test]
    fn test_single_run_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = FileRunRecorder::new(dir.path());
        let mut original = report(0);
        original.verdict = Some(VerdictRecord {
            target_level: CefrLevel::B1,
            per_dimension: BTreeMap::new(),
            rubric_level_pass: true,
            overall_pass: true,
        });
        let run_id = recorder.append(&original).unwrap();

        let readout = recorder.read_history().unwrap();
        assert!(readout.is_clean());
        assert_eq!(readout.runs.len(), 1);
        assert_eq!(readout.runs[0].run_id, run_id);
        assert_eq!(readout.runs[0].report, original);
    }

    #[test]
    fn test_hundred_runs_roundtrip_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = FileRunRecorder::new(dir.path());
        let originals: Vec<RunReport> = (0..100).map(report).collect();
        let ids: Vec<RunId> = originals.iter().map(|r| recorder.append(r).unwrap()).collect();

        let readout = recorder.read_history().unwrap();
        assert!(readout.is_clean());
        assert_eq!(readout.runs.len(), 100);
        for (i, run) in readout.runs.iter().enumerate() {
            assert_eq!(run.run_id, ids[i]);
            assert_eq!(run.report, originals[i]);
        }
    }

    #[test]
    fn test_read_orders_oldest_first() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = FileRunRecorder::new(dir.path());
        recorder.append(&report(5)).unwrap();
        recorder.append(&report(1)).unwrap();
        let readout = recorder.read_history().unwrap();
        assert_eq!(readout.runs[0].report.input_id, "take-1.wav");
        assert_eq!(readout.runs[1].report.input_id, "take-5.wav");
    }

    #[test]
    fn test_missing_directory_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = FileRunRecorder::new(&dir.path().join("never-created"));
        let readout = recorder.read_history().unwrap();
        assert!(readout.runs.is_empty());
        assert!(readout.is_clean());
    }

    #[test]
    fn test_truncated_last_entry_is_one_discarded_trailing() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = FileRunRecorder::new(dir.path());
        for i in 0..3 {
            recorder.append(&report(i)).unwrap();
        }
        let path = recorder.structured_path();
        let mut bytes = fs::read(&path).unwrap();
        let last_start = bytes[..bytes.len() - 1]
            .iter()
            .rposition(|&b| b == b'\n')
            .unwrap()
            + 1;
        let cut = last_start + (bytes.len() - last_start) / 2;
        bytes.truncate(cut);
        fs::write(&path, bytes).unwrap();

        let readout = recorder.read_history().unwrap();
        assert_eq!(readout.runs.len(), 2);
        assert_eq!(readout.discarded_trailing, 1);
        assert_eq!(readout.discarded_interior, 0);
        assert_eq!(readout.runs[1].report, report(1));
    }

    #[test]
    fn test_append_after_torn_line_keeps_new_record_intact() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = FileRunRecorder::new(dir.path());
        recorder.append(&report(0)).unwrap();
        let mut file = OpenOptions::new()
            .append(true)
            .open(recorder.structured_path())
            .unwrap();
        file.write_all(b"{\"run_id\": \"torn").unwrap();
        drop(file);

        recorder.append(&report(1)).unwrap();
        let readout = recorder.read_history().unwrap();
        assert_eq!(readout.runs.len(), 2);
        assert_eq!(readout.discarded_trailing, 0);
        assert_eq!(readout.discarded_interior, 1);
    }

    #[test]
    fn test_row_torn_inside_quoted_field_does_not_swallow_next_row() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = FileRunRecorder::new(dir.path());
        recorder.append(&report(0)).unwrap();

        let foreign = recorder.tabular_bytes(RunId::new(), &report(9)).unwrap();
        let foreign = String::from_utf8(foreign).unwrap();
        let cut = foreign.find("weekly, pra").unwrap() + "weekly, pra".len();
        let mut file = OpenOptions::new()
            .append(true)
            .open(recorder.tabular_path())
            .unwrap();
        file.write_all(foreign[..cut].as_bytes()).unwrap();
        drop(file);

        recorder.append(&report(1)).unwrap();
        let readout = recorder.read_history().unwrap();
        assert_eq!(readout.runs.len(), 2);
        assert!(readout.inconsistencies.is_empty(), "{:?}", readout.inconsistencies);
        assert_eq!(readout.discarded_tabular, 1);
        assert_eq!(recorder.repair_tabular().unwrap(), 0);
    }

    #[test]
    fn test_row_torn_after_run_id_counts_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = FileRunRecorder::new(dir.path());
        let id = recorder.append(&report(0)).unwrap();

        let csv_text = fs::read_to_string(recorder.tabular_path()).unwrap();
        let (header, row) = csv_text.split_once('\n').unwrap();
        let torn = &row[..row.find(',').unwrap() + 10];
        fs::write(recorder.tabular_path(), format!("{header}\n{torn}")).unwrap();

        let readout = recorder.read_history().unwrap();
        assert_eq!(readout.inconsistencies, vec![Inconsistency::MissingTabularRow(id)]);
        assert_eq!(readout.discarded_tabular, 1);
        assert!(!readout.is_clean());

        assert_eq!(recorder.repair_tabular().unwrap(), 1);
        let repaired = recorder.read_history().unwrap();
        assert!(repaired.inconsistencies.is_empty());
        assert_eq!(repaired.runs.len(), 1);
    }

    #[test]
    fn test_line_breaks_in_notes_stay_on_one_tabular_line() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = FileRunRecorder::new(dir.path());
        let mut multiline = report(0);
        multiline.notes = "prima riga\nseconda riga".to_string();
        recorder.append(&multiline).unwrap();
        recorder.append(&report(1)).unwrap();

        let readout = recorder.read_history().unwrap();
        assert!(readout.is_clean());
        assert_eq!(readout.runs[0].report.notes, "prima riga\nseconda riga");

        let csv_text = fs::read_to_string(recorder.tabular_path()).unwrap();
        assert_eq!(csv_text.lines().count(), 3);
        assert!(csv_text.contains("prima riga seconda riga"));
    }

    #[test]
    fn test_missing_tabular_row_detected_and_repaired() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = FileRunRecorder::new(dir.path());
        let kept = recorder.append(&report(0)).unwrap();
        let csv_before = fs::read(recorder.tabular_path()).unwrap();
        let lost = recorder.append(&report(1)).unwrap();
        fs::write(recorder.tabular_path(), &csv_before).unwrap();

        let readout = recorder.read_history().unwrap();
        assert_eq!(readout.runs.len(), 2);
        assert_eq!(readout.inconsistencies, vec![Inconsistency::MissingTabularRow(lost)]);
        assert!(!readout.inconsistencies.contains(&Inconsistency::MissingTabularRow(kept)));

        assert_eq!(recorder.repair_tabular().unwrap(), 1);
        assert_eq!(recorder.repair_tabular().unwrap(), 0);
        assert!(recorder.read_history().unwrap().is_clean());
    }

    #[test]
    fn test_failed_tabular_write_is_partial_write() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = FileRunRecorder::new(dir.path());
        fs::create_dir(recorder.tabular_path()).unwrap();

        let err = recorder.append(&report(0)).unwrap_err();
        let RecorderError::PartialWrite { run_id, .. } = err else {
            panic!("expected partial write, got {err}");
        };
        fs::remove_dir(recorder.tabular_path()).unwrap();
        let readout = recorder.read_history().unwrap();
        assert_eq!(readout.runs.len(), 1);
        assert_eq!(readout.inconsistencies, vec![Inconsistency::MissingTabularRow(run_id)]);
    }

    #[test]
    fn test_missing_structured_record_detected() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = FileRunRecorder::new(dir.path());
        let id = recorder.append(&report(0)).unwrap();
        fs::write(recorder.structured_path(), b"").unwrap();

        let readout = recorder.read_history().unwrap();
        assert!(readout.runs.is_empty());
        assert_eq!(readout.inconsistencies, vec![Inconsistency::MissingStructuredRecord(id)]);
    }

    #[test]
    fn test_tabular_layout() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = FileRunRecorder::new(dir.path());
        let id = recorder.append(&report(0)).unwrap();
        recorder.append(&report(1)).unwrap();

        let mut reader = csv::Reader::from_path(recorder.tabular_path()).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec![
                "run_id",
                "timestamp",
                "input_id",
                "language",
                "duration_s",
                "word_count",
                "wpm",
                "pause_count",
                "filler_rate",
                "complexity_index",
                "overall_level",
                "target_level",
                "overall_pass",
                "label",
                "notes",
                "scorer_model",
                "transcriber_model",
            ]
        );
        let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][0], id.to_string());
        assert_eq!(&rows[0][10], "B1");
        assert_eq!(&rows[0][11], "");
        assert_eq!(&rows[0][13], "weekly, practice");
        assert_eq!(&rows[0][14], "città; \"note\"");
    }

    #[test]
    fn test_concurrent_appends_do_not_interleave() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_path_buf();
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let path = path.clone();
                std::thread::spawn(move || {
                    let recorder = FileRunRecorder::new(&path);
                    for i in 0..10 {
                        recorder.append(&report(t * 10 + i)).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let readout = FileRunRecorder::new(&path).read_history().unwrap();
        assert_eq!(readout.runs.len(), 40);
        assert_eq!(readout.discarded_trailing + readout.discarded_interior, 0);
        assert!(readout.inconsistencies.is_empty());
    }
}
