use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// CEFR proficiency level. Declaration order is the proficiency order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CefrLevel {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
}

impl CefrLevel {
    pub const ALL: &[CefrLevel] = &[
        CefrLevel::A1,
        CefrLevel::A2,
        CefrLevel::B1,
        CefrLevel::B2,
        CefrLevel::C1,
        CefrLevel::C2,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CefrLevel::A1 => "A1",
            CefrLevel::A2 => "A2",
            CefrLevel::B1 => "B1",
            CefrLevel::B2 => "B2",
            CefrLevel::C1 => "C1",
            CefrLevel::C2 => "C2",
        }
    }
}

impl fmt::Display for CefrLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("'{0}' is not a CEFR level (expected A1..C2)")]
pub struct UnknownLevel(pub String);

impl FromStr for CefrLevel {
    type Err = UnknownLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        CefrLevel::ALL
            .iter()
            .copied()
            .find(|level| level.as_str() == normalized)
            .ok_or_else(|| UnknownLevel(s.to_string()))
    }
}

pub const UNKNOWN_LEVEL_LABEL: &str = "unknown";

/// A level judgement that may be undetermined.
///
/// `Unknown` is a regular value, not an error: it is what the rubric holds
/// when the scorer's answer could not be read or named no valid level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LevelAssessment {
    Level(CefrLevel),
    Unknown,
}

impl LevelAssessment {
    /// Coerces free text from a scorer into a level; anything outside the
    /// enumeration becomes `Unknown`.
    pub fn from_label(label: &str) -> Self {
        label
            .parse::<CefrLevel>()
            .map(LevelAssessment::Level)
            .unwrap_or(LevelAssessment::Unknown)
    }

    pub fn level(&self) -> Option<CefrLevel> {
        match self {
            LevelAssessment::Level(level) => Some(*level),
            LevelAssessment::Unknown => None,
        }
    }

    /// True when this judgement is at or above `target`. `Unknown` never meets a target.
    pub fn meets(&self, target: CefrLevel) -> bool {
        self.level().is_some_and(|level| level >= target)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, LevelAssessment::Unknown)
    }
}

impl fmt::Display for LevelAssessment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelAssessment::Level(level) => level.fmt(f),
            LevelAssessment::Unknown => f.write_str(UNKNOWN_LEVEL_LABEL),
        }
    }
}

impl From<String> for LevelAssessment {
    fn from(value: String) -> Self {
        LevelAssessment::from_label(&value)
    }
}

impl From<LevelAssessment> for String {
    fn from(value: LevelAssessment) -> Self {
        value.to_string()
    }
}

impl From<CefrLevel> for LevelAssessment {
    fn from(level: CefrLevel) -> Self {
        LevelAssessment::Level(level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_levels_are_ordered() {
        assert!(CefrLevel::A1 < CefrLevel::A2);
        assert!(CefrLevel::B1 < CefrLevel::B2);
        assert!(CefrLevel::C1 < CefrLevel::C2);
        let mut sorted = CefrLevel::ALL.to_vec();
        sorted.sort();
        assert_eq!(sorted, CefrLevel::ALL);
    }

    #[rstest]
    #[case::upper("B2", CefrLevel::B2)]
    #[case::lower("c1", CefrLevel::C1)]
    #[case::padded("  a2 ", CefrLevel::A2)]
    fn test_parse_level(#[case] input: &str, #[case] expected: CefrLevel) {
        assert_eq!(input.parse::<CefrLevel>().unwrap(), expected);
    }

    #[test]
    fn test_parse_rejects_unknown_level() {
        let err = "D1".parse::<CefrLevel>().unwrap_err();
        assert_eq!(err, UnknownLevel("D1".to_string()));
        assert_eq!(err.to_string(), "'D1' is not a CEFR level (expected A1..C2)");
    }

    #[rstest]
    #[case::plus_suffix("B2+")]
    #[case::numeric("4")]
    #[case::empty("")]
    #[case::word("advanced")]
    fn test_unrecognised_labels_become_unknown(#[case] input: &str) {
        assert_eq!(LevelAssessment::from_label(input), LevelAssessment::Unknown);
    }

    #[test]
    fn test_unknown_never_meets_target() {
        assert!(!LevelAssessment::Unknown.meets(CefrLevel::A1));
    }

    #[test]
    fn test_meets_is_inclusive() {
        let b1 = LevelAssessment::Level(CefrLevel::B1);
        assert!(b1.meets(CefrLevel::B1));
        assert!(b1.meets(CefrLevel::A2));
        assert!(!b1.meets(CefrLevel::B2));
    }

    #[test]
    fn test_assessment_serializes_as_label() {
        let json = serde_json::to_string(&LevelAssessment::Level(CefrLevel::C2)).unwrap();
        assert_eq!(json, "\"C2\"");
        let json = serde_json::to_string(&LevelAssessment::Unknown).unwrap();
        assert_eq!(json, "\"unknown\"");
        let back: LevelAssessment = serde_json::from_str("\"unknown\"").unwrap();
        assert_eq!(back, LevelAssessment::Unknown);
    }
}
