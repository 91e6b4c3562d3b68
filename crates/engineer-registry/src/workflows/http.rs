use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use super::error::{RepositoryError, WorkflowError};
use crate::auth::AccessError;

pub(crate) fn error_response(status: StatusCode, message: String) -> Response {
    (status, axum::Json(json!({ "error": message }))).into_response()
}

pub(crate) fn workflow_status(error: &WorkflowError) -> StatusCode {
    match error {
        WorkflowError::Unauthorized(AccessError::Forbidden { .. }) => StatusCode::FORBIDDEN,
        WorkflowError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        WorkflowError::NotFound { .. } => StatusCode::NOT_FOUND,
        WorkflowError::InvalidTransition { .. } => StatusCode::CONFLICT,
        WorkflowError::ValidationFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

pub(crate) fn repository_status(error: &RepositoryError) -> StatusCode {
    match error {
        RepositoryError::Conflict | RepositoryError::VersionMismatch { .. } => StatusCode::CONFLICT,
        RepositoryError::NotFound => StatusCode::NOT_FOUND,
        RepositoryError::Unavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub(crate) fn access_response(error: AccessError) -> Response {
    let error = WorkflowError::from(error);
    error_response(workflow_status(&error), error.to_string())
}
