use std::collections::VecDeque;
use std::sync::Mutex;

use crate::rubric::domain::scorer::{Scorer, ScorerError};

/// Replays a fixed list of replies, one per call, and remembers every prompt
/// it was given. Used by the self-test and in tests.
pub struct ScriptedScorer {
    replies: Mutex<VecDeque<Result<String, ScorerError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedScorer {
    pub fn new(replies: Vec<Result<String, ScorerError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn from_replies(replies: &[&str]) -> Self {
        Self::new(replies.iter().map(|r| Ok(r.to_string())).collect())
    }

    pub fn call_count(&self) -> usize {
        self.prompts().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Scorer for ScriptedScorer {
    fn score(&self, prompt: &str) -> Result<String, ScorerError> {
        self.prompts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(prompt.to_string());
        self.replies
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front()
            .unwrap_or_else(|| Err(ScorerError::Failed("scripted scorer has no replies left".into())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replays_in_order_then_fails() {
        let scorer = ScriptedScorer::from_replies(&["one", "two"]);
        assert_eq!(scorer.score("a").unwrap(), "one");
        assert_eq!(scorer.score("b").unwrap(), "two");
        assert!(matches!(scorer.score("c"), Err(ScorerError::Failed(_))));
        assert_eq!(scorer.prompts(), vec!["a", "b", "c"]);
        assert_eq!(scorer.call_count(), 3);
    }
}
