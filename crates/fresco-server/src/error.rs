use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use fresco_store::StoreError;
use thiserror::Error;

/// Field name -> messages, as rendered in the `errors` object of the
/// response envelope.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, Error)]
pub enum ApiError {
    /// An entity id or username did not resolve.
    #[error("{0}")]
    NotFound(String),

    /// Input failed shape or constraint validation; carries field-level
    /// messages.
    #[error("Validation failed")]
    Validation(FieldErrors),

    /// No valid session.
    #[error("{0}")]
    Unauthorized(String),

    /// Login failed.  Deliberately opaque: does not reveal whether the
    /// account or the password was wrong.
    #[error("The provided credentials do not match our records.")]
    InvalidCredentials,

    /// Valid session, wrong owner.
    #[error("Unauthorized action")]
    Forbidden,

    /// Business-rule conflict: self-follow, duplicate follow, unfollow of a
    /// non-followed target.
    #[error("{0}")]
    Conflict(String),

    /// The request is well-formed but the current state makes it a no-op
    /// (e.g. removing a profile picture when none is set).
    #[error("{0}")]
    BadState(String),

    /// File write/delete failure.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Anything else.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// A validation failure on a single field.
    pub fn field(field: &str, message: &str) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.to_string()]);
        ApiError::Validation(errors)
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => ApiError::NotFound("Record not found".to_string()),
            StoreError::Conflict => ApiError::Conflict("Record already exists".to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

/// Map [`StoreError::NotFound`] to an entity-specific 404 message; defer to
/// the blanket conversion for everything else.
pub fn or_not_found(e: StoreError, message: &str) -> ApiError {
    match e {
        StoreError::NotFound => ApiError::NotFound(message.to_string()),
        other => other.into(),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) | ApiError::Conflict(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Unauthorized(_) | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::BadState(_) => StatusCode::BAD_REQUEST,
            ApiError::Storage(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Internal details stay in the logs, not the response.
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
        }

        let body = match &self {
            ApiError::Validation(errors) => serde_json::json!({
                "success": false,
                "message": "Validation failed",
                "errors": errors,
            }),
            ApiError::InvalidCredentials => serde_json::json!({
                "success": false,
                "errors": { "login": [self.to_string()] },
            }),
            ApiError::Storage(_) | ApiError::Internal(_) => serde_json::json!({
                "success": false,
                "message": "Internal server error",
            }),
            other => serde_json::json!({
                "success": false,
                "message": other.to_string(),
            }),
        };

        (status, axum::Json(body)).into_response()
    }
}
