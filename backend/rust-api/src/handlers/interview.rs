use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use std::sync::Arc;

use crate::{
    error::AppError,
    extractors::AppJson,
    middlewares::auth::JwtClaims,
    models::assessment::{GenerateQuizResponse, ListAssessmentsResponse, SubmitQuizRequest},
    models::User,
    services::{assessment_service::AssessmentService, quiz_service::QuizService, AppState},
};

pub async fn generate_quiz(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!("Generating quiz for identity={}", claims.sub);

    let user = resolve_user(&state, &claims).await?;

    let service = QuizService::new(state.provider.clone());
    let questions = service.generate_quiz(&user.profile()).await?;

    Ok((StatusCode::OK, Json(GenerateQuizResponse { questions })))
}

pub async fn submit_quiz(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    AppJson(req): AppJson<SubmitQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!(
        "Grading quiz submission for identity={}, questions={}",
        claims.sub,
        req.questions.len()
    );

    let user = resolve_user(&state, &claims).await?;

    let service = AssessmentService::new(state.store.clone(), state.provider.clone());
    let assessment = service
        .grade_and_save(&user, &req.questions, &req.answers)
        .await?;

    Ok((StatusCode::CREATED, Json(assessment)))
}

pub async fn list_assessments(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!("Listing assessments for identity={}", claims.sub);

    let user = resolve_user(&state, &claims).await?;

    let service = AssessmentService::new(state.store.clone(), state.provider.clone());
    let assessments = service.list_assessments(&user).await?;

    Ok((StatusCode::OK, Json(ListAssessmentsResponse { assessments })))
}

/// A resolved identity with no user document is a distinct failure from a
/// missing token: the auth middleware handles the latter.
async fn resolve_user(state: &AppState, claims: &JwtClaims) -> Result<User, AppError> {
    state
        .store
        .find_user_by_identity(&claims.sub)
        .await
        .map_err(AppError::Persistence)?
        .ok_or(AppError::UserNotFound)
}
