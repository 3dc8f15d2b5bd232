use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use sqlx::error::ErrorKind;
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum ApiError {
    #[error("request validation failed")]
    Validation(Vec<FieldError>),

    #[error("email address already in use")]
    EmailAlreadyExists,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("missing or malformed bearer token")]
    Unauthorized,

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token")]
    InvalidToken,

    #[error("user not found")]
    UserNotFound,

    #[error("bookmark not found")]
    BookmarkNotFound,

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("database error: {0}")]
    Database(#[from] SqlxError),

    #[error("password hashing error: {0}")]
    Password(#[from] bcrypt::BcryptError),

    #[error("token signing error: {0}")]
    Token(jsonwebtoken::errors::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        // A unique-index hit on users.email surfaces from the store as a
        // constraint error; clients see the same 409 as the pre-check path.
        if let ApiError::Database(SqlxError::Database(ref db_err)) = self
            && matches!(db_err.kind(), ErrorKind::UniqueViolation)
        {
            return ApiError::EmailAlreadyExists.into_response();
        }

        let (status, body) = match self {
            ApiError::Validation(details) => (
                StatusCode::BAD_REQUEST,
                ErrorBody::new("Invalid request data", "VALIDATION_ERROR").with_details(details),
            ),
            ApiError::EmailAlreadyExists => (
                StatusCode::CONFLICT,
                ErrorBody::new(
                    "This email address is already in use",
                    "EMAIL_ALREADY_EXISTS",
                ),
            ),
            ApiError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ErrorBody::new("Invalid credentials", "INVALID_CREDENTIALS"),
            ),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                ErrorBody::new("Authentication required", "UNAUTHORIZED"),
            ),
            ApiError::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                ErrorBody::new("Token has expired", "TOKEN_EXPIRED"),
            ),
            ApiError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                ErrorBody::new("Invalid token", "INVALID_TOKEN"),
            ),
            ApiError::UserNotFound => (
                StatusCode::NOT_FOUND,
                ErrorBody::new("User not found", "USER_NOT_FOUND"),
            ),
            ApiError::BookmarkNotFound => (
                StatusCode::NOT_FOUND,
                ErrorBody::new("Bookmark not found", "BOOKMARK_NOT_FOUND"),
            ),
            ApiError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                ErrorBody::new("Too many requests, please try again later", "RATE_LIMITED"),
            ),
            ApiError::Database(e) => {
                tracing::error!(error = %e, "storage failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    internal_error_body(&e.to_string()),
                )
            }
            ApiError::Password(e) => {
                tracing::error!(error = %e, "password hashing failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    internal_error_body(&e.to_string()),
                )
            }
            ApiError::Token(e) => {
                tracing::error!(error = %e, "token signing failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    internal_error_body(&e.to_string()),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

/// Standardized API error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ErrorBody {
    fn new(message: &str, error: &str) -> Self {
        Self {
            message: message.to_string(),
            error: error.to_string(),
            details: None,
            detail: None,
        }
    }

    fn with_details(mut self, details: Vec<FieldError>) -> Self {
        self.details = Some(details);
        self
    }
}

/// One field-level violation inside a `VALIDATION_ERROR` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

fn internal_error_body(detail: &str) -> ErrorBody {
    let mut body = ErrorBody::new("An internal server error occurred", "INTERNAL_SERVER_ERROR");
    // Internals are exposed outside production only.
    if std::env::var("ENVIRONMENT").as_deref() != Ok("production") {
        body.detail = Some(detail.to_string());
    }
    body
}
