use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Wire shape of every failed response. `field` names the offending request
/// field so clients can attach the message to the right form input.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<&'static str>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("Account not found")]
    NotFound,

    #[error("Email already registered")]
    Conflict,

    #[error("Old password is incorrect")]
    InvalidCredentials,

    #[error("New password must be different from the current password")]
    SamePassword,

    // Fixed client-facing message; the cause only goes to the log.
    #[error("Internal server error")]
    Internal(#[source] anyhow::Error),
}

impl ApiError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        ApiError::Validation {
            field,
            message: message.into(),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. }
            | ApiError::Conflict
            | ApiError::InvalidCredentials
            | ApiError::SamePassword => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn field(&self) -> Option<&'static str> {
        match self {
            ApiError::Validation { field, .. } => Some(field),
            ApiError::Conflict => Some("email"),
            ApiError::InvalidCredentials => Some("oldPassword"),
            ApiError::SamePassword => Some("newPassword"),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(err) = &self {
            error!(error = %err, "request failed");
        }
        let body = Json(ErrorBody {
            success: false,
            error: self.to_string(),
            field: self.field(),
        });
        (self.status(), body).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err)
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        // The unique index on users.email is the authoritative duplicate
        // check; a violation surfacing past the handler's pre-check still
        // maps to Conflict.
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return ApiError::Conflict;
            }
        }
        ApiError::Internal(err.into())
    }
}
