use std::time::Duration;

use thiserror::Error;

/// Failure of a single scorer call at the transport level.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScorerError {
    #[error("scorer call failed: {0}")]
    Failed(String),
    #[error("scorer call timed out after {0:?}")]
    TimedOut(Duration),
}

/// The scorer stayed unreachable after every allowed attempt.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("scorer failed after {attempts} attempts: {last}")]
pub struct TransportError {
    pub attempts: usize,
    #[source]
    pub last: ScorerError,
}

/// Domain interface for the external scoring model.
///
/// Takes a prompt and returns free-form text that is expected, but not
/// guaranteed, to contain a JSON object. Implementations may block for
/// seconds.
pub trait Scorer: Send + Sync {
    fn score(&self, prompt: &str) -> Result<String, ScorerError>;
}

impl<F> Scorer for F
where
    F: Fn(&str) -> Result<String, ScorerError> + Send + Sync,
{
    fn score(&self, prompt: &str) -> Result<String, ScorerError> {
        self(prompt)
    }
}
