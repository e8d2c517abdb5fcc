//! Structured API error responses with stable error codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::infra::WorkflowError;

/// Machine-readable error codes, stable for client-side handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationFailed,
    InvalidStateTransition,
    PreconditionFailed,
    Conflict,
    NotFound,
    Forbidden,
    InvalidRequestBody,
    StorageError,
    ExternalServiceError,
    InternalError,
}

impl ErrorCode {
    pub fn http_status(&self) -> StatusCode {
        match self {
            ErrorCode::ValidationFailed
            | ErrorCode::InvalidStateTransition
            | ErrorCode::PreconditionFailed
            | ErrorCode::InvalidRequestBody => StatusCode::BAD_REQUEST,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::StorageError | ErrorCode::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ErrorCode::ExternalServiceError => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::InvalidStateTransition => "INVALID_STATE_TRANSITION",
            ErrorCode::PreconditionFailed => "PRECONDITION_FAILED",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::InvalidRequestBody => "INVALID_REQUEST_BODY",
            ErrorCode::StorageError => "STORAGE_ERROR",
            ErrorCode::ExternalServiceError => "EXTERNAL_SERVICE_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured error body: `{"error": {"code", "message", "details"?}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ErrorDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetails {
                code,
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.error.details = Some(details);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.error.code.http_status()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.error.code.as_str();
        let mut response = (status, Json(self)).into_response();
        if let Ok(value) = axum::http::HeaderValue::from_str(code) {
            response.headers_mut().insert(
                axum::http::HeaderName::from_static("x-error-code"),
                value,
            );
        }
        response
    }
}

impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        match &err {
            WorkflowError::Validation { missing } => {
                ApiError::new(ErrorCode::ValidationFailed, err.to_string())
                    .with_details(serde_json::json!({ "missing_fields": missing }))
            }
            WorkflowError::InvalidState { status, .. } => {
                ApiError::new(ErrorCode::InvalidStateTransition, err.to_string())
                    .with_details(serde_json::json!({ "current_status": status.as_str() }))
            }
            WorkflowError::Precondition(_) => {
                ApiError::new(ErrorCode::PreconditionFailed, err.to_string())
            }
            WorkflowError::Conflict {
                application_id,
                expected,
                actual,
            } => ApiError::new(ErrorCode::Conflict, err.to_string()).with_details(
                serde_json::json!({
                    "application_id": application_id.to_string(),
                    "expected_version": expected,
                    "actual_version": actual,
                }),
            ),
            WorkflowError::NotFound(id) => ApiError::new(
                ErrorCode::NotFound,
                format!("application not found: {id}"),
            ),
            WorkflowError::Forbidden { .. } => {
                ApiError::new(ErrorCode::Forbidden, err.to_string())
            }
            WorkflowError::Storage(_) => {
                ApiError::new(ErrorCode::StorageError, err.to_string())
            }
            WorkflowError::External(_) => {
                ApiError::new(ErrorCode::ExternalServiceError, err.to_string())
            }
            WorkflowError::Internal(_) => {
                ApiError::new(ErrorCode::InternalError, err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ApplicationId, ApplicationStatus};

    #[test]
    fn status_mapping() {
        assert_eq!(
            ErrorCode::ValidationFailed.http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ErrorCode::Conflict.http_status(), StatusCode::CONFLICT);
        assert_eq!(ErrorCode::NotFound.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::Forbidden.http_status(), StatusCode::FORBIDDEN);
        assert_eq!(
            ErrorCode::ExternalServiceError.http_status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn validation_error_carries_missing_fields() {
        let err = WorkflowError::Validation {
            missing: vec!["income".to_string()],
        };
        let api: ApiError = err.into();
        assert_eq!(api.error.code, ErrorCode::ValidationFailed);
        assert_eq!(
            api.error.details.unwrap()["missing_fields"],
            serde_json::json!(["income"])
        );
    }

    #[test]
    fn conflict_error_carries_versions() {
        let err = WorkflowError::Conflict {
            application_id: ApplicationId::new(),
            expected: 3,
            actual: 4,
        };
        let api: ApiError = err.into();
        assert_eq!(api.error.code, ErrorCode::Conflict);
        assert_eq!(api.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn invalid_state_reports_current_status() {
        let err = WorkflowError::InvalidState {
            status: ApplicationStatus::Approved,
            operation: "submit",
        };
        let api: ApiError = err.into();
        assert_eq!(
            api.error.details.unwrap()["current_status"],
            serde_json::json!("approved")
        );
    }

    #[test]
    fn serialization_uses_screaming_snake_codes() {
        let api = ApiError::new(ErrorCode::PreconditionFailed, "documents not verified");
        let json = serde_json::to_string(&api).unwrap();
        assert!(json.contains("PRECONDITION_FAILED"));
    }
}
