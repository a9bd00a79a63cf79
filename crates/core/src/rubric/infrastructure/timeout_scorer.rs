use std::sync::Arc;
use std::time::Duration;

use crate::rubric::domain::scorer::{Scorer, ScorerError};

/// Bounds the wall-clock time of any scorer.
///
/// Each call runs on its own thread; if no reply arrives within `timeout`
/// the call fails with [`ScorerError::TimedOut`]. The worker thread is
/// detached and its late reply is dropped.
pub struct TimeoutScorer {
    inner: Arc<dyn Scorer>,
    timeout: Duration,
}

impl TimeoutScorer {
    pub fn new(inner: Arc<dyn Scorer>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Scorer for TimeoutScorer {
    fn score(&self, prompt: &str) -> Result<String, ScorerError> {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let inner = Arc::clone(&self.inner);
        let prompt = prompt.to_string();
        std::thread::spawn(move || {
            let _ = tx.send(inner.score(&prompt));
        });

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                log::warn!("Scorer did not answer within {:?}", self.timeout);
                Err(ScorerError::TimedOut(self.timeout))
            }
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                Err(ScorerError::Failed("scorer thread panicked".into()))
            }
        }
    }
}
