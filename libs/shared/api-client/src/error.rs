use reqwest::StatusCode;
use thiserror::Error;

use shared_models::error::AppError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Backend rejected the access token")]
    Unauthorized,

    #[error("Session expired, please sign in again")]
    SessionExpired,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("API error ({status}): {message}")]
    Rejected { status: StatusCode, message: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Translates a service failure into the HTTP-facing error.
///
/// Backend failures keep their meaning (an expired session is still an auth
/// problem for the browser); anything else is an internal error.
pub fn app_error(err: anyhow::Error) -> AppError {
    match err.downcast::<ApiError>() {
        Ok(api_error) => AppError::from(api_error),
        Err(other) => AppError::Internal(other.to_string()),
    }
}

impl From<ApiError> for AppError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Unauthorized | ApiError::SessionExpired => AppError::Auth(err.to_string()),
            ApiError::NotFound(msg) => AppError::NotFound(msg),
            ApiError::Rejected { status, message } => match status {
                StatusCode::BAD_REQUEST => AppError::BadRequest(message),
                StatusCode::FORBIDDEN => AppError::Auth(message),
                StatusCode::CONFLICT => AppError::Conflict(message),
                _ => AppError::ExternalService(format!("{}: {}", status, message)),
            },
            ApiError::Transport(e) => AppError::ExternalService(e.to_string()),
            ApiError::Decode(e) => AppError::ExternalService(e.to_string()),
        }
    }
}
