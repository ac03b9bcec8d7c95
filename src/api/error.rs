use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ApiResponse;
use crate::services::{AccessError, AuthError};

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),

    ValidationError(String),

    Conflict(String),

    Unauthorized(String),

    /// Feature not included in the caller's tier. Carries the upgrade hint.
    Forbidden { message: String, upgrade_url: String },

    /// Daily quota spent. Carries the upgrade hint.
    QuotaExceeded { message: String, upgrade_url: String },

    DatabaseError(String),

    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden { message, .. } => write!(f, "Forbidden: {}", message),
            ApiError::QuotaExceeded { message, .. } => write!(f, "Quota exceeded: {}", message),
            ApiError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message, upgrade_url) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            ApiError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg, None),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg, None),
            ApiError::Forbidden {
                message,
                upgrade_url,
            } => (StatusCode::FORBIDDEN, message, Some(upgrade_url)),
            ApiError::QuotaExceeded {
                message,
                upgrade_url,
            } => (StatusCode::TOO_MANY_REQUESTS, message, Some(upgrade_url)),
            ApiError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                    None,
                )
            }
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let mut body = ApiResponse::<()>::error(error_message);
        body.upgrade_url = upgrade_url;
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidEmail | AuthError::WeakPassword(_) | AuthError::Validation(_) => {
                ApiError::ValidationError(err.to_string())
            }
            AuthError::AlreadyExists => ApiError::Conflict(err.to_string()),
            AuthError::UserNotFound => ApiError::NotFound(err.to_string()),
            AuthError::InvalidCredentials | AuthError::Deactivated => {
                ApiError::Unauthorized(err.to_string())
            }
            AuthError::Database(msg) => ApiError::DatabaseError(msg),
            AuthError::Session(msg) | AuthError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::ValidationError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::InternalError(msg.into())
    }

    /// Maps access-check failures, attaching the upgrade hint that 403/429
    /// responses carry.
    pub fn from_access(err: AccessError, upgrade_url: &str) -> Self {
        match err {
            AccessError::FeatureNotEntitled { .. } => ApiError::Forbidden {
                message: err.to_string(),
                upgrade_url: upgrade_url.to_string(),
            },
            AccessError::QuotaExhausted { .. } => ApiError::QuotaExceeded {
                message: err.to_string(),
                upgrade_url: upgrade_url.to_string(),
            },
            AccessError::UserNotFound => ApiError::Unauthorized("User not found".to_string()),
            AccessError::Database(msg) => ApiError::DatabaseError(msg),
        }
    }
}
