use std::sync::Arc;

use crate::error::AppError;
use crate::metrics::{PROVIDER_REQUESTS_TOTAL, QUIZZES_GENERATED_TOTAL};
use crate::models::assessment::QuizQuestion;
use crate::models::UserProfile;
use crate::services::provider::CompletionProvider;
use crate::utils::quiz_parser::{parse_quiz_payload, truncate_for_log, EXPECTED_QUESTION_COUNT};

/// At most two provider calls per generation: the initial prompt and one
/// stricter retry. First valid payload wins.
const MAX_GENERATION_ATTEMPTS: usize = 2;

/// Raw model output kept in failure logs, in characters.
const RAW_OUTPUT_LOG_CHARS: usize = 300;

const QUIZ_JSON_SHAPE: &str = r#"{
  "questions": [
    {
      "question": "string",
      "options": ["string", "string", "string", "string"],
      "correctAnswer": "string",
      "explanation": "string"
    }
  ]
}"#;

pub struct QuizService {
    provider: Arc<dyn CompletionProvider>,
}

impl QuizService {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self { provider }
    }

    /// Generates a quiz tailored to the user's industry and skills.
    ///
    /// Stateless and side-effect free besides the provider calls: no
    /// caching, no persistence.
    pub async fn generate_quiz(
        &self,
        profile: &UserProfile,
    ) -> Result<Vec<QuizQuestion>, AppError> {
        for attempt in 1..=MAX_GENERATION_ATTEMPTS {
            let prompt = if attempt == 1 {
                initial_prompt(profile)
            } else {
                retry_prompt().to_string()
            };

            let raw = match self.provider.complete(&prompt).await {
                Ok(raw) => {
                    PROVIDER_REQUESTS_TOTAL
                        .with_label_values(&["quiz", "success"])
                        .inc();
                    raw
                }
                Err(e) => {
                    PROVIDER_REQUESTS_TOTAL
                        .with_label_values(&["quiz", "error"])
                        .inc();
                    tracing::warn!(attempt, "Quiz provider call failed: {:#}", e);
                    continue;
                }
            };

            match parse_quiz_payload(&raw) {
                Ok(questions) => {
                    tracing::info!(
                        attempt,
                        count = questions.len(),
                        "Quiz payload accepted"
                    );
                    QUIZZES_GENERATED_TOTAL
                        .with_label_values(&["success"])
                        .inc();
                    return Ok(questions);
                }
                Err(failure) => {
                    tracing::warn!(
                        attempt,
                        %failure,
                        raw = %truncate_for_log(&raw, RAW_OUTPUT_LOG_CHARS),
                        "Quiz payload rejected"
                    );
                }
            }
        }

        tracing::error!(
            attempts = MAX_GENERATION_ATTEMPTS,
            "Quiz generation exhausted all attempts"
        );
        QUIZZES_GENERATED_TOTAL.with_label_values(&["failed"]).inc();
        Err(AppError::GenerationFailed)
    }
}

fn initial_prompt(profile: &UserProfile) -> String {
    let expertise = if profile.skills.is_empty() {
        String::new()
    } else {
        format!(" with expertise in {}", profile.skills.join(", "))
    };

    format!(
        "Generate {count} technical interview questions for a {industry} professional{expertise}.\n\
         \n\
         Each question should be multiple choice with 4 options.\n\
         \n\
         Return the response in this JSON format only, no additional text:\n\
         {shape}",
        count = EXPECTED_QUESTION_COUNT,
        industry = profile.industry,
        expertise = expertise,
        shape = QUIZ_JSON_SHAPE,
    )
}

fn retry_prompt() -> String {
    format!(
        "Please return ONLY valid JSON in the exact format below with exactly {count} items \
         in the \"questions\" array and no additional text or markdown:\n\
         {shape}\n\
         \n\
         Previous response was not valid. Now return the corrected JSON.",
        count = EXPECTED_QUESTION_COUNT,
        shape = QUIZ_JSON_SHAPE,
    )
}
