use hyper::StatusCode;
use thiserror::Error;

use crate::database::StoreError;

/// Failure of an access-control operation.
///
/// `Display` carries internal detail for logs; [`AuthError::to_message`] is
/// what leaves the process.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("authentication required")]
    Unauthorized,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("token error: {0}")]
    Token(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn to_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::StorageUnavailable(_) => "SERVICE_UNAVAILABLE",
            Self::Token(_) => "INVALID_TOKEN",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn to_message(&self) -> String {
        match self {
            Self::Validation(msg)
            | Self::Forbidden(msg)
            | Self::NotFound(msg)
            | Self::Conflict(msg) => msg.clone(),
            Self::InvalidCredentials => "Invalid email or password".to_string(),
            Self::Unauthorized => "Authentication required".to_string(),
            Self::StorageUnavailable(_) => {
                "Service temporarily unavailable, please retry".to_string()
            }
            Self::Token(_) => "Invalid or expired session".to_string(),
            Self::Internal(_) => "An internal error occurred".to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials | Self::Unauthorized | Self::Token(_) => {
                StatusCode::UNAUTHORIZED
            }
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Only transient infrastructure failures are worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StorageUnavailable(_))
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(detail) => Self::StorageUnavailable(detail),
            StoreError::Conflict(detail) => Self::Conflict(detail),
            StoreError::Corrupt(detail) => Self::Internal(detail),
        }
    }
}
