use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::transcript::domain::transcript::{InputError, Transcript, TranscriptSegment};
use crate::transcript::domain::transcript_source::TranscriptSource;

#[derive(Deserialize)]
#[serde(untagged)]
enum TranscriptDocument {
    Bare(Vec<TranscriptSegment>),
    Wrapped { segments: Vec<TranscriptSegment> },
}

/// Reads a transcript from a JSON file: either a bare array of segments or
/// an object with a `segments` array.
#[derive(Debug)]
pub struct JsonTranscriptReader {
    path: PathBuf,
}

impl JsonTranscriptReader {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    pub fn parse(json: &str, path: &Path) -> Result<Transcript, InputError> {
        let doc: TranscriptDocument =
            serde_json::from_str(json).map_err(|source| InputError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        let segments = match doc {
            TranscriptDocument::Bare(segments) => segments,
            TranscriptDocument::Wrapped { segments } => segments,
        };
        Transcript::new(segments)
    }
}

impl TranscriptSource for JsonTranscriptReader {
    fn load(&self) -> Result<Transcript, InputError> {
        let json = fs::read_to_string(&self.path).map_err(|source| InputError::Read {
            path: self.path.clone(),
            source,
        })?;
        let transcript = Self::parse(&json, &self.path)?;
        log::debug!(
            "Loaded {} segments from {}",
            transcript.segments().len(),
            self.path.display()
        );
        Ok(transcript)
    }

    fn input_id(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const BARE: &str = r#"[
        {"text": "Oggi parlo", "start_s": 0.0, "end_s": 1.0, "confidence": 0.9},
        {"text": "del lavoro.", "start_s": 1.2, "end_s": 2.0, "confidence": 0.8}
    ]"#;

    #[test]
    fn test_reads_bare_array() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("sample.json");
        fs::write(&path, BARE).unwrap();

        let reader = JsonTranscriptReader::new(&path);
        let transcript = reader.load().unwrap();
        assert_eq!(transcript.segments().len(), 2);
        assert_eq!(reader.input_id(), "sample.json");
    }

    #[test]
    fn test_reads_wrapped_document() {
        let json = format!(r#"{{"segments": {BARE}}}"#);
        let transcript = JsonTranscriptReader::parse(&json, Path::new("x.json")).unwrap();
        assert_eq!(transcript.text(), "Oggi parlo del lavoro.");
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let reader = JsonTranscriptReader::new(Path::new("/nonexistent/transcript.json"));
        assert!(matches!(reader.load(), Err(InputError::Read { .. })));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let result = JsonTranscriptReader::parse("{not json", Path::new("bad.json"));
        assert!(matches!(result, Err(InputError::Parse { .. })));
    }

    #[test]
    fn test_invalid_timing_propagates_input_error() {
        let json = r#"[{"text": "x", "start_s": 2.0, "end_s": 1.0, "confidence": 0.9}]"#;
        let result = JsonTranscriptReader::parse(json, Path::new("bad.json"));
        assert!(matches!(result, Err(InputError::InvertedSpan { .. })));
    }
}
