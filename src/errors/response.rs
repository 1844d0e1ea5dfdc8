use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use crate::errors::{AppError, StoreError};

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AppError::Authorization(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Credential(e) if e.is_client_fault() => StatusCode::UNAUTHORIZED,
            AppError::Store(StoreError::DuplicateEmail(_)) => StatusCode::CONFLICT,
            AppError::Credential(_) | AppError::Store(_) | AppError::Unexpected(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    // Internal details stay in the log, never in the body.
    fn public_message(&self) -> String {
        match self {
            AppError::Credential(e) if e.is_client_fault() => e.to_string(),
            AppError::Store(StoreError::DuplicateEmail(_)) => "Email already registered".into(),
            AppError::Credential(_) | AppError::Store(_) | AppError::Unexpected(_) => {
                "Internal server error".into()
            }
            other => other.to_string(),
        }
    }
}

// The IntoResponse trait implementation converts AppError into the JSON envelope.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Request rejected with {}: {}", status, self);
        }

        let body = json!({
            "success": false,
            "message": self.public_message(),
        });
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(format!("Invalid path parameter: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(format!("Invalid query string: {}", rejection.body_text()))
    }
}
