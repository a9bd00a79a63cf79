use crate::shared::constants::PAUSE_TOLERANCE_S;
use crate::transcript::domain::word_token::WordToken;

/// Silence between two consecutive words that reached the pause threshold.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PauseInterval {
    pub start_s: f64,
    pub end_s: f64,
}

impl PauseInterval {
    pub fn duration(&self) -> f64 {
        self.end_s - self.start_s
    }
}

/// One interval per consecutive token pair whose gap is at least
/// `threshold_s`. Silence before the first or after the last token is
/// never a pause.
pub fn detect_pauses(tokens: &[WordToken], threshold_s: f64) -> Vec<PauseInterval> {
    tokens
        .windows(2)
        .filter_map(|pair| {
            let (prev, next) = (&pair[0], &pair[1]);
            let gap = next.start_s - prev.end_s;
            (gap + PAUSE_TOLERANCE_S >= threshold_s).then_some(PauseInterval {
                start_s: prev.end_s,
                end_s: next.start_s,
            })
        })
        .collect()
}
