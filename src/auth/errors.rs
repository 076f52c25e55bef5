use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("User not found")]
    UserNotFound,
    #[error("Email already exists")]
    EmailAlreadyExists,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Missing authorization header")]
    MissingAuthHeader,
    #[error("Invalid authorization header format")]
    InvalidAuthHeaderFormat,
    #[error("Insufficient permissions")]
    InsufficientPermissions,
    #[error("Password validation failed: {0}")]
    PasswordValidation(String),
    #[error("Email validation failed: {0}")]
    EmailValidation(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("Password hashing error: {0}")]
    PasswordHashing(#[from] crate::auth::password::PasswordError),
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InvalidCredentials
            | AuthError::InvalidToken
            | AuthError::TokenExpired
            | AuthError::MissingAuthHeader
            | AuthError::InvalidAuthHeaderFormat
            | AuthError::Jwt(_) => StatusCode::UNAUTHORIZED,
            // Login reports unknown emails as bad credentials
            AuthError::UserNotFound => StatusCode::UNAUTHORIZED,
            AuthError::EmailAlreadyExists => StatusCode::CONFLICT,
            AuthError::InsufficientPermissions => StatusCode::FORBIDDEN,
            AuthError::PasswordValidation(_) | AuthError::EmailValidation(_) => StatusCode::BAD_REQUEST,
            AuthError::PasswordHashing(err) if err.is_policy_violation() => StatusCode::BAD_REQUEST,
            AuthError::Database(_) | AuthError::PasswordHashing(_) | AuthError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials | AuthError::UserNotFound => "INVALID_CREDENTIALS",
            AuthError::EmailAlreadyExists => "EMAIL_EXISTS",
            AuthError::InvalidToken | AuthError::Jwt(_) => "INVALID_TOKEN",
            AuthError::TokenExpired => "TOKEN_EXPIRED",
            AuthError::MissingAuthHeader => "MISSING_CREDENTIALS",
            AuthError::InvalidAuthHeaderFormat => "INVALID_AUTH_HEADER",
            AuthError::InsufficientPermissions => "FORBIDDEN",
            AuthError::PasswordValidation(_) => "INVALID_PASSWORD",
            AuthError::EmailValidation(_) => "INVALID_EMAIL",
            AuthError::PasswordHashing(err) if err.is_policy_violation() => "INVALID_PASSWORD",
            AuthError::Database(_) => "DATABASE_ERROR",
            AuthError::PasswordHashing(_) | AuthError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn public_message(&self) -> String {
        match self {
            AuthError::UserNotFound => "Invalid credentials".to_string(),
            AuthError::Database(_) => "Database error".to_string(),
            AuthError::Jwt(_) => "Token error".to_string(),
            AuthError::PasswordHashing(err) if err.is_policy_violation() => err.to_string(),
            AuthError::PasswordHashing(_) => "Password processing error".to_string(),
            AuthError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "authentication failure");
        } else {
            tracing::warn!(error = %self, "authentication rejected");
        }

        let body = Json(json!({
            "success": false,
            "error": {
                "code": self.error_code(),
                "message": self.public_message(),
                "details": null,
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::PasswordError;

    #[test]
    fn test_unknown_user_looks_like_bad_credentials() {
        let err = AuthError::UserNotFound;
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.error_code(), "INVALID_CREDENTIALS");
        assert_eq!(err.public_message(), "Invalid credentials");
    }

    #[test]
    fn test_password_policy_errors_are_client_errors() {
        let err = AuthError::PasswordHashing(PasswordError::TooShort);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err = AuthError::PasswordHashing(PasswordError::HashingFailed);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
