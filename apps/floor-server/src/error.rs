use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Domain errors. Every variant is detected before the first mutation of a
/// request, so an error response always means "nothing happened".
#[derive(Error, Debug, PartialEq)]
pub enum FloorError {
    #[error("Company not found")]
    CompanyNotFound,
    #[error("Agent {0} not found in company")]
    AgentNotFound(String),
    #[error("Movement not found")]
    MovementNotFound,
    #[error("Invalid event_type: {0}")]
    InvalidEventType(String),
    #[error("Agent {0} already exists in company")]
    DuplicateAgent(String),
    #[error("Agent limit exceeded ({0} agents per company)")]
    AgentLimitExceeded(usize),
    #[error("Progress must be between 0.0 and 1.0, got {0}")]
    InvalidProgress(f64),
}

impl FloorError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            FloorError::CompanyNotFound
            | FloorError::AgentNotFound(_)
            | FloorError::MovementNotFound => StatusCode::NOT_FOUND,
            FloorError::InvalidEventType(_) | FloorError::AgentLimitExceeded(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            FloorError::DuplicateAgent(_) => StatusCode::CONFLICT,
            FloorError::InvalidProgress(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for FloorError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
