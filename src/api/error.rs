use axum::{Json, http::StatusCode, response::IntoResponse};
use thiserror::Error;

use super::models::ErrorResponse;
use crate::content::ContentError;
use crate::documents::UpdateError;
use crate::handlers::{HandlerError, RegistryError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("payload invalid: {0}")]
    InvalidPayload(String),
    #[error("Missing required fields")]
    MissingFields,
    #[error("payload exceeds the {0} byte limit")]
    PayloadTooLarge(usize),
    #[error("{0}")]
    InvalidDocument(String),
    #[error("{0}")]
    NoHandler(String),
    #[error("{0}")]
    Upstream(String),
    #[error("Internal server error. {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            ApiError::MissingFields => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::InvalidDocument(_) => StatusCode::BAD_REQUEST,
            ApiError::NoHandler(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidPayload(_) => "INVALID_PAYLOAD",
            ApiError::MissingFields => "MISSING_FIELDS",
            ApiError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            ApiError::InvalidDocument(_) => "INVALID_DOCUMENT",
            ApiError::NoHandler(_) => "NO_HANDLER",
            ApiError::Upstream(_) => "UPSTREAM_ERROR",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let body = ErrorResponse {
            code: self.code().to_string(),
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(value: serde_json::Error) -> Self {
        ApiError::InvalidPayload(value.to_string())
    }
}

impl From<RegistryError> for ApiError {
    fn from(value: RegistryError) -> Self {
        ApiError::NoHandler(value.to_string())
    }
}

impl From<ContentError> for ApiError {
    fn from(value: ContentError) -> Self {
        ApiError::Upstream(value.to_string())
    }
}

impl From<UpdateError> for ApiError {
    fn from(value: UpdateError) -> Self {
        match value {
            UpdateError::Content(err) => err.into(),
            other => ApiError::InvalidDocument(other.to_string()),
        }
    }
}

impl From<HandlerError> for ApiError {
    fn from(value: HandlerError) -> Self {
        match value {
            HandlerError::Update(err) => err.into(),
            HandlerError::Content(err) => err.into(),
            other => ApiError::InvalidDocument(other.to_string()),
        }
    }
}
