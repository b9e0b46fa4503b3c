//! Decoder for untrusted provider output into a validated quiz.
//!
//! The model reply is free text: it may wrap the JSON in markdown fences,
//! surround it with prose, or be malformed altogether. Decoding is a pure
//! function: normalize (strip fences), locate the best-effort JSON span,
//! strict-parse, then schema-validate.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

use crate::models::assessment::QuizQuestion;

pub const EXPECTED_QUESTION_COUNT: usize = 10;
pub const OPTIONS_PER_QUESTION: usize = 4;

lazy_static! {
    // ``` or ```json markers, with the optional trailing newline.
    static ref CODE_FENCE: Regex = Regex::new(r"```(?:[A-Za-z]+)?\n?").unwrap();
    // Greedy first-{ to last-} span; dot matches newlines.
    static ref JSON_SPAN: Regex = Regex::new(r"(?s)\{.*\}").unwrap();
}

#[derive(Debug, thiserror::Error)]
pub enum ParseFailure {
    #[error("invalid JSON: {0}")]
    Json(String),
    #[error("expected {EXPECTED_QUESTION_COUNT} questions, got {0}")]
    WrongCount(usize),
    #[error("question {index}: {reason}")]
    BadQuestion { index: usize, reason: String },
}

#[derive(Debug, Deserialize)]
struct QuizPayload {
    questions: Vec<QuizQuestion>,
}

/// Parse and validate a raw model reply into exactly
/// [`EXPECTED_QUESTION_COUNT`] well-formed questions.
pub fn parse_quiz_payload(raw: &str) -> Result<Vec<QuizQuestion>, ParseFailure> {
    let cleaned = strip_code_fences(raw);
    let candidate = json_candidate(&cleaned);

    let payload: QuizPayload =
        serde_json::from_str(candidate).map_err(|e| ParseFailure::Json(e.to_string()))?;

    validate_questions(payload.questions)
}

/// Remove markdown code-fence markers, keeping the fenced content.
fn strip_code_fences(raw: &str) -> String {
    CODE_FENCE.replace_all(raw, "").trim().to_string()
}

/// The first `{ ... }` brace-delimited span, or the whole cleaned text when
/// no braces are present (the strict parse then reports the real problem).
fn json_candidate(cleaned: &str) -> &str {
    match JSON_SPAN.find(cleaned) {
        Some(m) => m.as_str(),
        None => cleaned,
    }
}

fn validate_questions(questions: Vec<QuizQuestion>) -> Result<Vec<QuizQuestion>, ParseFailure> {
    if questions.len() != EXPECTED_QUESTION_COUNT {
        return Err(ParseFailure::WrongCount(questions.len()));
    }

    for (index, q) in questions.iter().enumerate() {
        if q.options.len() != OPTIONS_PER_QUESTION {
            return Err(ParseFailure::BadQuestion {
                index,
                reason: format!(
                    "expected {} options, got {}",
                    OPTIONS_PER_QUESTION,
                    q.options.len()
                ),
            });
        }
        if !q.options.contains(&q.correct_answer) {
            return Err(ParseFailure::BadQuestion {
                index,
                reason: "correctAnswer is not one of the options".to_string(),
            });
        }
    }

    Ok(questions)
}

/// Bounded prefix of a raw model reply for diagnostics, so logs capture
/// format drift without retaining whole responses.
pub fn truncate_for_log(raw: &str, max_chars: usize) -> String {
    if raw.chars().count() <= max_chars {
        return raw.to_string();
    }
    let prefix: String = raw.chars().take(max_chars).collect();
    format!("{}...", prefix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn quiz_json(count: usize) -> String {
        let questions: Vec<serde_json::Value> = (0..count)
            .map(|i| {
                json!({
                    "question": format!("Question {}?", i),
                    "options": ["A", "B", "C", "D"],
                    "correctAnswer": "B",
                    "explanation": "Because."
                })
            })
            .collect();
        json!({ "questions": questions }).to_string()
    }

    #[test]
    fn parses_bare_json() {
        let questions = parse_quiz_payload(&quiz_json(10)).unwrap();
        assert_eq!(questions.len(), 10);
        assert_eq!(questions[0].correct_answer, "B");
    }

    #[test]
    fn fenced_json_parses_like_bare_json() {
        let bare = quiz_json(10);
        let fenced = format!("```json\n{}\n```", bare);
        assert_eq!(
            parse_quiz_payload(&fenced).unwrap(),
            parse_quiz_payload(&bare).unwrap()
        );
    }

    #[test]
    fn fence_without_language_tag_is_stripped() {
        let fenced = format!("```\n{}\n```", quiz_json(10));
        assert!(parse_quiz_payload(&fenced).is_ok());
    }

    #[test]
    fn surrounding_prose_is_ignored() {
        let raw = format!("Here you go:\n```json\n{}\n```\nHope that helps!", quiz_json(10));
        assert!(parse_quiz_payload(&raw).is_ok());
    }

    #[test]
    fn wrong_count_is_rejected() {
        match parse_quiz_payload(&quiz_json(9)) {
            Err(ParseFailure::WrongCount(9)) => {}
            other => panic!("expected WrongCount(9), got {:?}", other),
        }
    }

    #[test]
    fn missing_questions_field_is_rejected() {
        let raw = r#"{"items": []}"#;
        assert!(matches!(
            parse_quiz_payload(raw),
            Err(ParseFailure::Json(_))
        ));
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(matches!(
            parse_quiz_payload("I could not generate a quiz, sorry."),
            Err(ParseFailure::Json(_))
        ));
    }

    #[test]
    fn wrong_option_count_is_rejected() {
        let raw = quiz_json(10).replacen(r#"["A","B","C","D"]"#, r#"["A","B","C"]"#, 1);
        assert!(matches!(
            parse_quiz_payload(&raw),
            Err(ParseFailure::BadQuestion { index: 0, .. })
        ));
    }

    #[test]
    fn foreign_correct_answer_is_rejected() {
        let raw = quiz_json(10).replacen(r#""correctAnswer":"B""#, r#""correctAnswer":"Z""#, 1);
        assert!(matches!(
            parse_quiz_payload(&raw),
            Err(ParseFailure::BadQuestion { index: 0, .. })
        ));
    }

    #[test]
    fn truncate_keeps_short_input_intact() {
        assert_eq!(truncate_for_log("short", 300), "short");
    }

    #[test]
    fn truncate_bounds_long_input() {
        let long = "x".repeat(1000);
        let truncated = truncate_for_log(&long, 300);
        assert_eq!(truncated.chars().count(), 303); // 300 + "..."
    }

    #[test]
    fn truncate_respects_multibyte_boundaries() {
        let long = "日".repeat(500);
        let truncated = truncate_for_log(&long, 300);
        assert!(truncated.ends_with("..."));
    }
}
