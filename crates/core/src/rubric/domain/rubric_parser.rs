use serde_json::{Map, Value};
use thiserror::Error;

use super::rubric_record::{RubricRecord, SkillDimension};
use crate::shared::cefr_level::LevelAssessment;

const OVERALL_KEY: &str = "overall";
const RATIONALE_KEY: &str = "rationale";

/// Why a scorer response could not be turned into a rubric. Recovered by
/// the exchange, never surfaced to callers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RubricParseError {
    #[error("response contains no JSON object")]
    NoJsonObject,
    #[error("response JSON is missing key '{0}'")]
    MissingKey(&'static str),
}

/// Parses a scorer response: the whole text as JSON first, then the first
/// balanced `{...}` inside it. Level values outside A1..C2 become `unknown`.
pub fn parse_rubric_response(raw: &str) -> Result<RubricRecord, RubricParseError> {
    let trimmed = raw.trim();
    let mut candidates = vec![trimmed];
    if let Some(object) = first_balanced_object(trimmed) {
        if object != trimmed {
            candidates.push(object);
        }
    }

    let mut last_error = RubricParseError::NoJsonObject;
    for candidate in candidates {
        let Ok(Value::Object(map)) = serde_json::from_str::<Value>(candidate) else {
            continue;
        };
        match rubric_from_object(&map, raw) {
            Ok(record) => return Ok(record),
            Err(e) => last_error = e,
        }
    }
    Err(last_error)
}

fn rubric_from_object(map: &Map<String, Value>, raw: &str) -> Result<RubricRecord, RubricParseError> {
    let mut level_scores = std::collections::BTreeMap::new();
    for &dimension in SkillDimension::ALL {
        let value = lookup(map, dimension.key())
            .or_else(|| alias_for(dimension).and_then(|alias| lookup(map, alias)))
            .ok_or(RubricParseError::MissingKey(dimension.key()))?;
        level_scores.insert(dimension, level_from_value(value));
    }
    let overall = lookup(map, OVERALL_KEY).ok_or(RubricParseError::MissingKey(OVERALL_KEY))?;

    let rationale = match lookup(map, RATIONALE_KEY) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };

    Ok(RubricRecord {
        level_scores,
        overall_level: level_from_value(overall),
        rationale,
        raw_response: raw.to_string(),
    })
}

// Earlier prompt revisions asked for "cohesion".
fn alias_for(dimension: SkillDimension) -> Option<&'static str> {
    match dimension {
        SkillDimension::Coherence => Some("cohesion"),
        _ => None,
    }
}

fn lookup<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    map.get(key).or_else(|| {
        map.iter()
            .find(|(k, _)| k.trim().eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    })
}

fn level_from_value(value: &Value) -> LevelAssessment {
    match value {
        Value::String(label) => LevelAssessment::from_label(label),
        _ => LevelAssessment::Unknown,
    }
}

/// The first `{...}` substring whose braces balance, ignoring braces inside
/// JSON string literals.
pub fn first_balanced_object(text: &str) -> Option<&str> {
    text.char_indices()
        .filter(|&(_, c)| c == '{')
        .find_map(|(start, _)| balanced_end(&text[start..]).map(|len| &text[start..start + len]))
}

fn balanced_end(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + c.len_utf8());
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::cefr_level::CefrLevel;
    use rstest::rstest;

    const VALID: &str = r#"{"fluency": "B2", "coherence": "B1", "range": "B2", "accuracy": "B1", "overall": "B2", "rationale": "Steady pace."}"#;

    #[test]
    fn test_strict_json_parses() {
        let record = parse_rubric_response(VALID).unwrap();
        assert_eq!(record.level(SkillDimension::Fluency), LevelAssessment::Level(CefrLevel::B2));
        assert_eq!(record.level(SkillDimension::Accuracy), LevelAssessment::Level(CefrLevel::B1));
        assert_eq!(record.overall_level, LevelAssessment::Level(CefrLevel::B2));
        assert_eq!(record.rationale, "Steady pace.");
        assert_eq!(record.raw_response, VALID);
    }

    #[test]
    fn test_json_inside_code_fence_and_prose() {
        let raw = format!("Here is my assessment:\n```json\n{VALID}\n```\nGood luck!");
        let record = parse_rubric_response(&raw).unwrap();
        assert_eq!(record.overall_level, LevelAssessment::Level(CefrLevel::B2));
        assert_eq!(record.raw_response, raw);
    }

    #[test]
    fn test_braces_inside_strings_do_not_confuse_extraction() {
        let raw = r#"Result: {"fluency": "C1", "coherence": "C1", "range": "B2", "accuracy": "B2", "overall": "C1", "rationale": "uses {set} phrases"} done"#;
        let record = parse_rubric_response(raw).unwrap();
        assert_eq!(record.rationale, "uses {set} phrases");
    }

    #[rstest]
    #[case::plain_text("not json at all")]
    #[case::empty("")]
    #[case::array("[1, 2, 3]")]
    #[case::unbalanced("{\"fluency\": \"B2\"")]
    fn test_no_object_is_error(#[case] raw: &str) {
        assert_eq!(parse_rubric_response(raw), Err(RubricParseError::NoJsonObject));
    }

    #[test]
    fn test_missing_key_is_error() {
        let raw = r#"{"fluency": "B2", "coherence": "B1", "range": "B2", "overall": "B2"}"#;
        assert_eq!(
            parse_rubric_response(raw),
            Err(RubricParseError::MissingKey("accuracy"))
        );
    }

    #[test]
    fn test_out_of_enumeration_levels_coerced_to_unknown() {
        let raw = r#"{"fluency": 4, "coherence": "B2+", "range": "native", "accuracy": "c2", "overall": null}"#;
        let record = parse_rubric_response(raw).unwrap();
        assert_eq!(record.level(SkillDimension::Fluency), LevelAssessment::Unknown);
        assert_eq!(record.level(SkillDimension::Coherence), LevelAssessment::Unknown);
        assert_eq!(record.level(SkillDimension::Range), LevelAssessment::Unknown);
        assert_eq!(record.level(SkillDimension::Accuracy), LevelAssessment::Level(CefrLevel::C2));
        assert_eq!(record.overall_level, LevelAssessment::Unknown);
        assert_eq!(record.rationale, "");
    }

    #[test]
    fn test_cohesion_alias_and_key_case() {
        let raw = r#"{"Fluency": "A2", "cohesion": "A2", "RANGE": "A1", "accuracy": "A2", "overall": "A2"}"#;
        let record = parse_rubric_response(raw).unwrap();
        assert_eq!(record.level(SkillDimension::Coherence), LevelAssessment::Level(CefrLevel::A2));
        assert_eq!(record.level(SkillDimension::Range), LevelAssessment::Level(CefrLevel::A1));
    }

    #[rstest]
    #[case::simple("x {\"a\": 1} y", Some("{\"a\": 1}"))]
    #[case::nested("{\"a\": {\"b\": 2}}", Some("{\"a\": {\"b\": 2}}"))]
    #[case::escaped_quote(r#"{"a": "say \"}\" now"}"#, Some(r#"{"a": "say \"}\" now"}"#))]
    #[case::none("no braces", None)]
    #[case::skips_unclosed_prefix("{ oops } {\"a\": 1}", Some("{ oops }"))]
    fn test_first_balanced_object(#[case] text: &str, #[case] expected: Option<&str>) {
        assert_eq!(first_balanced_object(text), expected);
    }
}
