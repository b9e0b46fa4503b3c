use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use serde_json::json;

/// Failure taxonomy of the interview API.
///
/// Client-facing bodies stay generic; diagnostic detail (raw provider
/// output, store errors) is logged server-side only.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Missing or invalid credentials")]
    Unauthorized,

    #[error("User not found")]
    UserNotFound,

    #[error("{0}")]
    InvalidInput(String),

    #[error("Failed to generate quiz questions")]
    GenerationFailed,

    #[error("Storage operation failed")]
    Persistence(#[source] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::UserNotFound => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::GenerationFailed => StatusCode::BAD_GATEWAY,
            AppError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Persistence(ref source) = self {
            tracing::error!("Persistence failure: {:#}", source);
        }

        let status = self.status();
        let body = json!({
            "message": self.to_string(),
            "status": status.as_u16(),
        });
        (status, Json(body)).into_response()
    }
}
