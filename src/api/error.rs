//! API error types with structured JSON responses.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::admission::AdmissionError;
use crate::opd::OpdError;
use crate::pipeline::drafts::DraftError;
use crate::pipeline::generation::GenerationError;
use crate::registry::RegistryError;
use crate::validation::{FieldError, ValidationErrors};

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldError>,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Generation returned no content")]
    GenerationEmpty,
    #[error("Generation failed: {0}")]
    Generation(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut fields = Vec::new();
        let (status, code, message) = match self {
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, "NOT_FOUND", detail),
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail),
            ApiError::Validation(errors) => {
                let code = if errors.is_missing_input() {
                    "MISSING_INPUT"
                } else {
                    "VALIDATION_FAILED"
                };
                let message = errors
                    .fields
                    .first()
                    .map(|f| f.message.clone())
                    .unwrap_or_else(|| "Validation failed".to_string());
                fields = errors.fields;
                (StatusCode::BAD_REQUEST, code, message)
            }
            ApiError::Conflict(detail) => (StatusCode::CONFLICT, "CONFLICT", detail),
            ApiError::GenerationEmpty => (
                StatusCode::BAD_GATEWAY,
                "GENERATION_EMPTY",
                "The AI model did not return any content.".to_string(),
            ),
            ApiError::Generation(detail) => {
                (StatusCode::BAD_GATEWAY, "GENERATION_FAILED", detail)
            }
            ApiError::Internal(detail) => {
                tracing::error!(detail = %detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code,
                message,
                fields,
            },
        };
        (status, Json(body)).into_response()
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(err: ValidationErrors) -> Self {
        ApiError::Validation(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<GenerationError> for ApiError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::Empty => ApiError::GenerationEmpty,
            other => ApiError::Generation(other.to_string()),
        }
    }
}

impl From<DraftError> for ApiError {
    fn from(err: DraftError) -> Self {
        match err {
            DraftError::Validation(e) => e.into(),
            DraftError::Generation(e) => e.into(),
        }
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound(id) => ApiError::NotFound(format!("Patient not found: {id}")),
            RegistryError::DuplicateId(id) => {
                ApiError::Conflict(format!("Patient id already registered: {id}"))
            }
            RegistryError::EmptyNote => ApiError::BadRequest("Note content is required".into()),
            RegistryError::LockPoisoned => ApiError::Internal("registry lock poisoned".into()),
        }
    }
}

impl From<AdmissionError> for ApiError {
    fn from(err: AdmissionError) -> Self {
        match err {
            AdmissionError::Validation(e) => e.into(),
            AdmissionError::Registry(e) => e.into(),
        }
    }
}

impl From<OpdError> for ApiError {
    fn from(err: OpdError) -> Self {
        match err {
            OpdError::TokensExhausted { .. } => ApiError::Conflict(err.to_string()),
            OpdError::LockPoisoned => ApiError::Internal(err.to_string()),
        }
    }
}
