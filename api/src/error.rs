use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use database::StoreError;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use thiserror::Error;

/// Per-field validation messages, keyed by canonical field name
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// API error taxonomy
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation failed")]
    Validation(FieldErrors),

    #[error("{0}")]
    Authentication(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Configuration(String),

    #[error("{0}")]
    Server(String),
}

/// Error envelope returned on every failure: `{error, code, details?}`
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorEnvelope {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn server(message: impl Into<String>) -> Self {
        ApiError::Server(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::Authentication(_) => "AUTHENTICATION_ERROR",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Configuration(_) => "CONFIGURATION_ERROR",
            ApiError::Server(_) => "SERVER_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let details = match &self {
            ApiError::Validation(errors) if !errors.is_empty() => Some(json!(errors)),
            _ => None,
        };

        let envelope = ErrorEnvelope {
            error: self.to_string(),
            code: self.error_code().to_string(),
            details,
        };

        (self.status_code(), Json(envelope)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => ApiError::NotFound("Post".to_string()),
            StoreError::Configuration(message) => ApiError::Configuration(message),
            StoreError::DuplicateSlug => {
                let mut errors = FieldErrors::new();
                errors.insert(
                    "slug".to_string(),
                    vec!["This slug is already in use".to_string()],
                );
                ApiError::Validation(errors)
            }
            other => ApiError::Server(other.to_string()),
        }
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_match_taxonomy() {
        assert_eq!(
            ApiError::Validation(FieldErrors::new()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::Authentication("no".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::NotFound("Post".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Configuration("bad".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_duplicate_slug_maps_to_field_error() {
        let err: ApiError = StoreError::DuplicateSlug.into();
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        let ApiError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert_eq!(errors["slug"], vec!["This slug is already in use"]);
    }

    #[test]
    fn test_store_not_found_maps_to_404() {
        let err: ApiError = StoreError::NotFound("id 7".into()).into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Post not found");
    }
}
