pub mod json_transcript_reader;
pub mod synthetic_transcript;
