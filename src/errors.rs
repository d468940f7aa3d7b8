use axum::http::StatusCode;
use axum::response::IntoResponse;
use thiserror::Error;

/// Failures talking to the news search API.
#[derive(Debug, Error)]
pub enum NewsError {
    #[error("News service is not configured")]
    Disabled,
    #[error("network error: {0}")]
    Network(String),
    #[error("HTTP {0}")]
    Status(u16),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("search window of {0} days is out of range")]
    InvalidWindow(u64),
}

/// Failures talking to the text-generation API.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM service is not configured")]
    Disabled,
    #[error("request timed out")]
    Timeout,
    #[error("network error: {0}")]
    NetworkError(String),
    #[error("API error: {0}")]
    ApiError(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Upstream error: {0}")]
    Upstream(String),
    #[error("Service unavailable: {0}")]
    Unavailable(String),
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            // Upstream details go to the log only; the body stays generic.
            AppError::Upstream(_) => (
                StatusCode::BAD_GATEWAY,
                "An upstream service failed. Please try again later.",
            )
                .into_response(),
            AppError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg).into_response(),
            AppError::Template(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

impl From<NewsError> for AppError {
    fn from(value: NewsError) -> Self {
        match value {
            NewsError::Disabled => AppError::Unavailable(value.to_string()),
            NewsError::InvalidWindow(_) => {
                AppError::Unavailable("News service is misconfigured".to_string())
            }
            other => AppError::Upstream(format!("news: {}", other)),
        }
    }
}

impl From<LlmError> for AppError {
    fn from(value: LlmError) -> Self {
        match value {
            LlmError::Disabled => AppError::Unavailable(value.to_string()),
            other => AppError::Upstream(format!("generation: {}", other)),
        }
    }
}
