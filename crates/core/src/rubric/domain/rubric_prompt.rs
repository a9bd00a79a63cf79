use crate::metrics::domain::metrics_record::MetricsRecord;
use crate::shared::language::Language;

pub const RESPONSE_KEYS: &[&str] = &["fluency", "coherence", "range", "accuracy", "overall", "rationale"];

/// Builds the fixed-shape scoring prompt: instructions, labelled metrics,
/// the verbatim transcript and the required JSON shape.
pub fn build_rubric_prompt(transcript: &str, metrics: &MetricsRecord) -> String {
    let language = Language::from_code(&metrics.language)
        .map(|l| l.name())
        .unwrap_or("the target language");

    format!(
        r#"You are a CEFR examiner for spoken {language}. Assess ONLY the oral proficiency shown in the transcript below (it was produced by speech recognition and may contain recognition errors).
Rate each dimension with one CEFR level from A1, A2, B1, B2, C1, C2: fluency, coherence, range, accuracy, and give an overall level.

OBJECTIVE METRICS:
- Duration: {duration:.2} s
- Speaking time: {speaking:.2} s
- Pause count: {pauses}
- Total pause time: {pause_total:.2} s
- Words: {words}
- Words per minute: {wpm:.1}
- Fillers: {fillers} (rate {filler_rate:.3})
- Cohesion markers: {cohesion}
- Complexity index (subordinate/conditional markers per sentence): {complexity:.2}

TRANSCRIPT:
"""{transcript}"""

Respond with a single JSON object and nothing else, using exactly these keys:
{{"fluency": "<level>", "coherence": "<level>", "range": "<level>", "accuracy": "<level>", "overall": "<level>", "rationale": "<two or three sentences>"}}
"#,
        duration = metrics.duration_s,
        speaking = metrics.speaking_time_s,
        pauses = metrics.pause_count,
        pause_total = metrics.pause_total_s,
        words = metrics.word_count,
        wpm = metrics.wpm,
        fillers = metrics.filler_count,
        filler_rate = metrics.filler_rate,
        cohesion = metrics.cohesion_marker_count,
        complexity = metrics.complexity_index,
        transcript = transcript.trim(),
    )
}

/// Follow-up sent once when the first answer could not be parsed.
pub fn build_repair_prompt(original_prompt: &str, previous_response: &str) -> String {
    format!(
        r#"{original_prompt}
Your previous response was:
"""{previous_response}"""
Your previous response was not valid JSON; return only JSON. Reply with exactly one JSON object with the keys {keys} and no other text."#,
        keys = RESPONSE_KEYS.join(", "),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics() -> MetricsRecord {
        MetricsRecord {
            duration_s: 12.3,
            speaking_time_s: 10.0,
            word_count: 20,
            wpm: 120.0,
            pause_count: 2,
            pause_total_s: 2.3,
            pause_rate: 9.76,
            filler_count: 2,
            filler_rate: 0.1,
            cohesion_marker_count: 1,
            complexity_trigger_count: 3,
            sentence_count: 2,
            complexity_index: 1.5,
            language: "it".to_string(),
            degenerate: false,
            language_fallback: false,
        }
    }

    #[test]
    fn test_prompt_includes_metrics_and_transcript() {
        let transcript = "  Questo è un test.  ";
        let prompt = build_rubric_prompt(transcript, &metrics());
        assert!(prompt.contains("Duration: 12.30 s"));
        assert!(prompt.contains("Words per minute: 120.0"));
        assert!(prompt.contains("Pause count: 2"));
        assert!(prompt.contains("TRANSCRIPT:"));
        assert!(prompt.contains("\"\"\"Questo è un test.\"\"\""));
        assert!(prompt.contains("spoken Italian"));
    }

    #[test]
    fn test_prompt_names_every_response_key() {
        let prompt = build_rubric_prompt("ciao", &metrics());
        for key in RESPONSE_KEYS {
            assert!(prompt.contains(&format!("\"{key}\"")), "missing key {key}");
        }
    }

    #[test]
    fn test_prompt_is_deterministic() {
        assert_eq!(
            build_rubric_prompt("ciao", &metrics()),
            build_rubric_prompt("ciao", &metrics())
        );
    }

    #[test]
    fn test_repair_prompt_quotes_previous_answer() {
        let repair = build_repair_prompt("ORIGINAL", "not json at all");
        assert!(repair.starts_with("ORIGINAL"));
        assert!(repair.contains("not json at all"));
        assert!(repair.contains("return only JSON"));
    }
}
