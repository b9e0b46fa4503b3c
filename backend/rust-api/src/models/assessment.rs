use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One multiple-choice question as produced by the generation flow.
///
/// Invariants (enforced by the payload decoder, never assumed from the
/// provider): exactly 4 options, `correct_answer` is one of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    #[serde(rename = "correctAnswer")]
    pub correct_answer: String,
    pub explanation: String,
}

/// A quiz question annotated with the user's answer and correctness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradedQuestion {
    pub question: String,
    /// The correct answer.
    pub answer: String,
    #[serde(rename = "userAnswer")]
    pub user_answer: String,
    #[serde(rename = "isCorrect")]
    pub is_correct: bool,
    pub explanation: String,
}

/// Persisted record of one completed quiz attempt.
/// Stored in the MongoDB "assessments" collection; immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assessment {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    /// Percentage, 0.0-100.0.
    #[serde(rename = "quizScore")]
    pub quiz_score: f64,
    pub questions: Vec<GradedQuestion>,
    pub category: String,
    #[serde(rename = "improvementTip")]
    pub improvement_tip: Option<String>,
    /// Stored as an RFC3339 string, not a bson date like `User.created_at`:
    /// the same representation goes to Mongo and into HTTP responses, and
    /// the `createdAt: 1` listing sort orders the strings.
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateQuizResponse {
    pub questions: Vec<QuizQuestion>,
}

/// Quiz submission: the questions the user was shown plus their answers,
/// positionally aligned. The score is computed server-side.
#[derive(Debug, Deserialize)]
pub struct SubmitQuizRequest {
    pub questions: Vec<QuizQuestion>,
    pub answers: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ListAssessmentsResponse {
    pub assessments: Vec<Assessment>,
}
