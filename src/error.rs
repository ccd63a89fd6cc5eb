use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Everything a handler can fail with, mapped onto the wire as
/// `{status, message}` with the matching HTTP status.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("User already exists")]
    DuplicateEmail,

    #[error("Invalid code")]
    ActivationMismatch,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("No token provided")]
    NoToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        ApiError::Internal(e.into())
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::DuplicateEmail | ApiError::ActivationMismatch | ApiError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::InvalidCredentials | ApiError::NoToken | ApiError::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        if let ApiError::Internal(ref e) = self {
            error!(error = %e, "internal error");
        }
        // Client-caused failures report "Fail", unclassified ones "Error".
        let label = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "Error"
        } else {
            "Fail"
        };
        let body = Json(json!({
            "status": label,
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}

/// True when the database rejected an insert on a unique constraint,
/// which for the users table can only be the email column.
pub fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}
