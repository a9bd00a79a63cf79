use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::shared::cefr_level::LevelAssessment;

/// The fixed rubric dimensions a scorer rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillDimension {
    Fluency,
    Coherence,
    Range,
    Accuracy,
}

impl SkillDimension {
    pub const ALL: &[SkillDimension] = &[
        SkillDimension::Fluency,
        SkillDimension::Coherence,
        SkillDimension::Range,
        SkillDimension::Accuracy,
    ];

    /// JSON key used in scorer responses.
    pub fn key(&self) -> &'static str {
        match self {
            SkillDimension::Fluency => "fluency",
            SkillDimension::Coherence => "coherence",
            SkillDimension::Range => "range",
            SkillDimension::Accuracy => "accuracy",
        }
    }
}

impl fmt::Display for SkillDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Rubric scores from the scoring model, plus the raw text they came from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RubricRecord {
    pub level_scores: BTreeMap<SkillDimension, LevelAssessment>,
    pub overall_level: LevelAssessment,
    pub rationale: String,
    pub raw_response: String,
}

impl RubricRecord {
    /// Every level `unknown`: the scorer answered but could not be understood.
    pub fn unknown(raw_response: &str) -> Self {
        Self {
            level_scores: SkillDimension::ALL
                .iter()
                .map(|&d| (d, LevelAssessment::Unknown))
                .collect(),
            overall_level: LevelAssessment::Unknown,
            rationale: String::new(),
            raw_response: raw_response.to_string(),
        }
    }

    pub fn level(&self, dimension: SkillDimension) -> LevelAssessment {
        self.level_scores
            .get(&dimension)
            .copied()
            .unwrap_or(LevelAssessment::Unknown)
    }

    pub fn is_fully_unknown(&self) -> bool {
        self.overall_level.is_unknown() && self.level_scores.values().all(|l| l.is_unknown())
    }
}
