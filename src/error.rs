use actix_multipart::MultipartError;
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use std::time::Duration;

use crate::models::ErrorResponse;

/// Errors visible to the caller of the HTTP API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("No file provided")]
    MissingInput,

    #[error("{0}")]
    Internal(String),
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        ApiError::Internal(format!("Failed to read upload: {}", e))
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingInput => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.to_string(),
        })
    }
}

/// Reasons a candidate resolver is considered unavailable.
///
/// These never reach the caller; the chain logs them and moves on.
#[derive(Debug, thiserror::Error)]
pub enum CandidateError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("no answer within {0:?}")]
    Timeout(Duration),

    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),

    #[error("expected a JSON body, got content type {0:?}")]
    NotJson(String),

    #[error("undecodable body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid prediction: {0}")]
    Invalid(String),
}
