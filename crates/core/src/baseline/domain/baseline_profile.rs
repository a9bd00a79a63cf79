use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::shared::cefr_level::CefrLevel;
use crate::shared::error::ConfigurationError;

/// Expected objective metrics for speech at one CEFR level.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BaselineProfile {
    /// Inclusive words-per-minute range.
    pub wpm_range: (f64, f64),
    pub filler_rate_max: f64,
    pub complexity_index_min: f64,
    /// Pauses per minute.
    pub pause_rate_max: f64,
}

impl BaselineProfile {
    pub const fn new(
        wpm_min: f64,
        wpm_max: f64,
        filler_rate_max: f64,
        complexity_index_min: f64,
        pause_rate_max: f64,
    ) -> Self {
        Self {
            wpm_range: (wpm_min, wpm_max),
            filler_rate_max,
            complexity_index_min,
            pause_rate_max,
        }
    }

    pub fn validate(&self, level: CefrLevel) -> Result<(), ConfigurationError> {
        let invalid = |reason: String| ConfigurationError::InvalidBaseline { level, reason };
        let fields = [
            ("wpm_range[0]", self.wpm_range.0),
            ("wpm_range[1]", self.wpm_range.1),
            ("filler_rate_max", self.filler_rate_max),
            ("complexity_index_min", self.complexity_index_min),
            ("pause_rate_max", self.pause_rate_max),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(format!("{name} must be a finite non-negative number, got {value}")));
            }
        }
        if self.wpm_range.0 > self.wpm_range.1 {
            return Err(invalid(format!(
                "wpm_range minimum {} exceeds maximum {}",
                self.wpm_range.0, self.wpm_range.1
            )));
        }
        Ok(())
    }
}

const BUILTIN_PROFILES: [(CefrLevel, BaselineProfile); 6] = [
    (CefrLevel::A1, BaselineProfile::new(40.0, 100.0, 0.15, 0.0, 30.0)),
    (CefrLevel::A2, BaselineProfile::new(60.0, 120.0, 0.12, 0.1, 25.0)),
    (CefrLevel::B1, BaselineProfile::new(80.0, 160.0, 0.10, 0.2, 20.0)),
    (CefrLevel::B2, BaselineProfile::new(100.0, 180.0, 0.08, 0.4, 15.0)),
    (CefrLevel::C1, BaselineProfile::new(110.0, 200.0, 0.06, 0.6, 12.0)),
    (CefrLevel::C2, BaselineProfile::new(120.0, 220.0, 0.05, 0.8, 10.0)),
];

/// One baseline profile per CEFR level. Read-only once built.
#[derive(Clone, Debug, PartialEq)]
pub struct BaselineTable {
    profiles: BTreeMap<CefrLevel, BaselineProfile>,
}

impl BaselineTable {
    pub fn new(profiles: BTreeMap<CefrLevel, BaselineProfile>) -> Result<Self, ConfigurationError> {
        for (level, profile) in &profiles {
            profile.validate(*level)?;
        }
        Ok(Self { profiles })
    }

    pub fn builtin() -> Self {
        Self {
            profiles: BUILTIN_PROFILES.into_iter().collect(),
        }
    }

    /// Replaces the profiles named in `overrides`, keeping the rest.
    pub fn with_overrides(
        mut self,
        overrides: &BTreeMap<CefrLevel, BaselineProfile>,
    ) -> Result<Self, ConfigurationError> {
        for (level, profile) in overrides {
            profile.validate(*level)?;
            self.profiles.insert(*level, *profile);
        }
        Ok(self)
    }

    pub fn get(&self, level: CefrLevel) -> Result<&BaselineProfile, ConfigurationError> {
        self.profiles
            .get(&level)
            .ok_or(ConfigurationError::MissingBaseline(level))
    }

    pub fn levels(&self) -> impl Iterator<Item = CefrLevel> + '_ {
        self.profiles.keys().copied()
    }
}

impl Default for BaselineTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_builtin_covers_every_level() {
        let table = BaselineTable::builtin();
        assert_eq!(table.levels().collect::<Vec<_>>(), CefrLevel::ALL.to_vec());
        for &level in CefrLevel::ALL {
            table.get(level).unwrap().validate(level).unwrap();
        }
    }

    #[test]
    fn test_b1_wpm_ceiling_is_160() {
        let b1 = BaselineTable::builtin();
        assert_eq!(b1.get(CefrLevel::B1).unwrap().wpm_range, (80.0, 160.0));
    }

    #[test]
    fn test_missing_level_is_configuration_error() {
        let mut profiles = BTreeMap::new();
        profiles.insert(CefrLevel::A1, BaselineProfile::new(40.0, 100.0, 0.15, 0.0, 30.0));
        let table = BaselineTable::new(profiles).unwrap();
        assert!(matches!(
            table.get(CefrLevel::C1),
            Err(ConfigurationError::MissingBaseline(CefrLevel::C1))
        ));
    }

    #[test]
    fn test_override_replaces_single_level() {
        let mut overrides = BTreeMap::new();
        overrides.insert(CefrLevel::B1, BaselineProfile::new(90.0, 150.0, 0.05, 0.5, 10.0));
        let table = BaselineTable::builtin().with_overrides(&overrides).unwrap();
        assert_eq!(table.get(CefrLevel::B1).unwrap().wpm_range, (90.0, 150.0));
        assert_eq!(table.get(CefrLevel::B2).unwrap().wpm_range, (100.0, 180.0));
    }

    #[rstest]
    #[case::inverted_range(BaselineProfile::new(160.0, 80.0, 0.1, 0.2, 20.0))]
    #[case::negative(BaselineProfile::new(80.0, 160.0, -0.1, 0.2, 20.0))]
    #[case::nan(BaselineProfile::new(80.0, f64::NAN, 0.1, 0.2, 20.0))]
    #[case::infinite(BaselineProfile::new(80.0, 160.0, 0.1, 0.2, f64::INFINITY))]
    fn test_invalid_profile_rejected(#[case] profile: BaselineProfile) {
        assert!(matches!(
            profile.validate(CefrLevel::B1),
            Err(ConfigurationError::InvalidBaseline { level: CefrLevel::B1, .. })
        ));
    }

    #[test]
    fn test_profile_deserializes_from_toml() {
        let profile: BaselineProfile = toml::from_str(
            "wpm_range = [70.0, 150.0]\nfiller_rate_max = 0.1\ncomplexity_index_min = 0.2\npause_rate_max = 18.0\n",
        )
        .unwrap();
        assert_eq!(profile, BaselineProfile::new(70.0, 150.0, 0.1, 0.2, 18.0));
    }
}
