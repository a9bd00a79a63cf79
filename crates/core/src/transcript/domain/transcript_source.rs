use super::transcript::{InputError, Transcript};

/// Domain interface for anything that supplies a finished, timed transcript.
///
/// The engine never talks to a transcription backend directly; a file
/// reader, a synthetic generator or a live recogniser all sit behind this.
pub trait TranscriptSource {
    fn load(&self) -> Result<Transcript, InputError>;

    /// Stable identifier recorded with each run (file name, prompt id, ...).
    fn input_id(&self) -> String;
}
