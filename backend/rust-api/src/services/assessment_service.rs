use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::AppError;
use crate::metrics::{ASSESSMENTS_SAVED_TOTAL, IMPROVEMENT_TIPS_TOTAL, PROVIDER_REQUESTS_TOTAL};
use crate::models::assessment::{Assessment, GradedQuestion, QuizQuestion};
use crate::models::User;
use crate::services::provider::CompletionProvider;
use crate::services::store::AssessmentStore;

/// Every assessment this service writes carries this category.
const ASSESSMENT_CATEGORY: &str = "Technical";

pub struct AssessmentService {
    store: Arc<dyn AssessmentStore>,
    provider: Arc<dyn CompletionProvider>,
}

impl AssessmentService {
    pub fn new(store: Arc<dyn AssessmentStore>, provider: Arc<dyn CompletionProvider>) -> Self {
        Self { store, provider }
    }

    /// Grades the submission, requests a best-effort improvement tip for
    /// imperfect results, and persists the assessment.
    pub async fn grade_and_save(
        &self,
        user: &User,
        questions: &[QuizQuestion],
        answers: &[String],
    ) -> Result<Assessment, AppError> {
        if questions.is_empty() {
            return Err(AppError::InvalidInput(
                "Quiz must contain at least one question".to_string(),
            ));
        }
        if answers.len() != questions.len() {
            return Err(AppError::InvalidInput(format!(
                "Expected {} answers, got {}",
                questions.len(),
                answers.len()
            )));
        }

        let (graded, quiz_score) = grade(questions, answers);

        tracing::info!(
            user_id = %user.id,
            quiz_score,
            total = graded.len(),
            "Quiz graded"
        );

        // Non-essential enhancement: a failed tip must never fail grading.
        let improvement_tip = if graded.iter().any(|g| !g.is_correct) {
            self.request_improvement_tip(user, &graded).await
        } else {
            None
        };

        let assessment = Assessment {
            id: Uuid::new_v4().to_string(),
            user_id: user.id.clone(),
            quiz_score,
            questions: graded,
            category: ASSESSMENT_CATEGORY.to_string(),
            improvement_tip,
            created_at: Utc::now(),
        };

        self.store
            .insert_assessment(&assessment)
            .await
            .map_err(AppError::Persistence)?;

        let had_tip = if assessment.improvement_tip.is_some() {
            "true"
        } else {
            "false"
        };
        ASSESSMENTS_SAVED_TOTAL.with_label_values(&[had_tip]).inc();

        Ok(assessment)
    }

    pub async fn list_assessments(&self, user: &User) -> Result<Vec<Assessment>, AppError> {
        self.store
            .list_assessments(&user.id)
            .await
            .map_err(AppError::Persistence)
    }

    /// Single provider request, no retry. Any failure or empty reply is
    /// logged and converted to `None`.
    async fn request_improvement_tip(
        &self,
        user: &User,
        graded: &[GradedQuestion],
    ) -> Option<String> {
        let prompt = improvement_prompt(&user.industry, graded);

        match self.provider.complete(&prompt).await {
            Ok(text) => {
                PROVIDER_REQUESTS_TOTAL
                    .with_label_values(&["improvement_tip", "success"])
                    .inc();
                let tip = text.trim().to_string();
                if tip.is_empty() {
                    IMPROVEMENT_TIPS_TOTAL.with_label_values(&["empty"]).inc();
                    tracing::warn!(user_id = %user.id, "Improvement tip was empty, skipping");
                    None
                } else {
                    IMPROVEMENT_TIPS_TOTAL.with_label_values(&["success"]).inc();
                    tracing::debug!(user_id = %user.id, "Improvement tip generated");
                    Some(tip)
                }
            }
            Err(e) => {
                PROVIDER_REQUESTS_TOTAL
                    .with_label_values(&["improvement_tip", "error"])
                    .inc();
                IMPROVEMENT_TIPS_TOTAL.with_label_values(&["error"]).inc();
                tracing::warn!(
                    user_id = %user.id,
                    "Improvement tip generation failed, continuing without: {:#}",
                    e
                );
                None
            }
        }
    }
}

/// Positional pairing of questions and answers. Pure; exact case-sensitive
/// string equality. Returns the graded questions and the score as a
/// percentage (0.0-100.0). Callers must reject empty submissions first;
/// `grade_and_save` does.
fn grade(questions: &[QuizQuestion], answers: &[String]) -> (Vec<GradedQuestion>, f64) {
    let graded: Vec<GradedQuestion> = questions
        .iter()
        .zip(answers.iter())
        .map(|(q, user_answer)| GradedQuestion {
            question: q.question.clone(),
            answer: q.correct_answer.clone(),
            user_answer: user_answer.clone(),
            is_correct: q.correct_answer == *user_answer,
            explanation: q.explanation.clone(),
        })
        .collect();

    let correct = graded.iter().filter(|g| g.is_correct).count();
    let score = correct as f64 / graded.len() as f64 * 100.0;

    (graded, score)
}

fn improvement_prompt(industry: &str, graded: &[GradedQuestion]) -> String {
    let wrong_questions_text = graded
        .iter()
        .filter(|g| !g.is_correct)
        .map(|g| {
            format!(
                "Question: \"{}\"\nCorrect Answer: \"{}\"\nUser Answer: \"{}\"",
                g.question, g.answer, g.user_answer
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "The user got the following {industry} technical interview questions wrong:\n\
         \n\
         {wrong_questions_text}\n\
         \n\
         Based on these mistakes, provide a concise, specific improvement tip.\n\
         Focus on the knowledge gaps revealed by these wrong answers.\n\
         Keep the response under 2 sentences and make it encouraging.\n\
         Don't explicitly mention the mistakes, instead focus on what to learn/practice."
    )
}
