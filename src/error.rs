//!
//! # Error Handling
//!
//! This module defines `AppError`, the error type every handler returns.
//! It implements `actix_web::error::ResponseError`, so any variant turns into an
//! HTTP response with a `{"error": <message>}` JSON body and the matching status.
//!
//! `From` implementations for `sqlx::Error`, `validator::ValidationErrors`,
//! `bcrypt::BcryptError` and `TokenError` let handlers lean on the `?` operator.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

use crate::auth::token::TokenError;

/// Message returned to clients for every token failure.
///
/// Token failures are deliberately indistinguishable from the outside; the
/// precise cause only reaches the server log.
pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized";

/// Postgres SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

/// Represents all errors a request can end in.
#[derive(Debug, Error)]
pub enum AppError {
    /// Authentication is missing or failed (HTTP 401).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    /// The caller is authenticated but does not own the resource (HTTP 403).
    #[error("Forbidden: {0}")]
    Forbidden(String),
    /// Malformed request (HTTP 400).
    #[error("Bad Request: {0}")]
    BadRequest(String),
    /// The requested resource does not exist (HTTP 404).
    #[error("Not Found: {0}")]
    NotFound(String),
    /// A uniqueness constraint was hit (HTTP 409).
    #[error("Conflict: {0}")]
    Conflict(String),
    /// Input failed field validation (HTTP 422).
    #[error("Validation Error: {0}")]
    ValidationError(String),
    /// A database operation failed (HTTP 500).
    #[error("Database Error: {0}")]
    DatabaseError(String),
    /// Anything else that went wrong on the server (HTTP 500).
    #[error("Internal Server Error: {0}")]
    InternalServerError(String),
}

impl AppError {
    fn message(&self) -> &str {
        match self {
            AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::BadRequest(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::ValidationError(msg)
            | AppError::InternalServerError(msg) => msg,
            // Database details stay in the log.
            AppError::DatabaseError(_) => "Database error",
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "error": self.message()
        }))
    }
}

/// `RowNotFound` becomes `NotFound`, unique violations become `Conflict`,
/// everything else is logged and reported as a `DatabaseError`.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match error {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            sqlx::Error::Database(ref db_err)
                if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) =>
            {
                AppError::Conflict(db_err.message().to_string())
            }
            _ => {
                log::error!("database error: {}", error);
                AppError::DatabaseError(error.to_string())
            }
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::ValidationError(error.to_string())
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::InternalServerError(format!("Credential hashing failed: {}", error))
    }
}

/// Signing failures are a server problem; every other token failure is a
/// generic 401 so clients cannot probe which check rejected them.
impl From<TokenError> for AppError {
    fn from(error: TokenError) -> AppError {
        match error {
            TokenError::Signing(msg) => {
                log::error!("token signing failed: {}", msg);
                AppError::InternalServerError("Failed to issue token".into())
            }
            _ => AppError::Unauthorized(UNAUTHORIZED_MESSAGE.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn test_error_statuses() {
        let cases = [
            (AppError::Unauthorized("no".into()), 401),
            (AppError::Forbidden("no".into()), 403),
            (AppError::BadRequest("no".into()), 400),
            (AppError::NotFound("no".into()), 404),
            (AppError::Conflict("no".into()), 409),
            (AppError::ValidationError("no".into()), 422),
            (AppError::DatabaseError("no".into()), 500),
            (AppError::InternalServerError("no".into()), 500),
        ];
        for (error, status) in cases {
            assert_eq!(error.error_response().status(), status, "{}", error);
        }
    }

    #[actix_rt::test]
    async fn test_error_body_shape() {
        let response = AppError::Forbidden("Not your todo".into()).error_response();
        let body = to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, json!({ "error": "Not your todo" }));
    }

    #[actix_rt::test]
    async fn test_database_error_detail_is_hidden() {
        let response = AppError::DatabaseError("relation \"users\" does not exist".into())
            .error_response();
        let body = to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Database error");
    }

    #[test]
    fn test_token_errors_collapse_to_generic_unauthorized() {
        let errors = [
            TokenError::Malformed("bad".into()),
            TokenError::UnexpectedAlgorithm("none".into()),
            TokenError::SignatureMismatch,
            TokenError::ClaimDecode("id".into()),
        ];
        for error in errors {
            match AppError::from(error) {
                AppError::Unauthorized(msg) => assert_eq!(msg, UNAUTHORIZED_MESSAGE),
                other => panic!("unexpected mapping: {:?}", other),
            }
        }

        match AppError::from(TokenError::Signing("empty secret".into())) {
            AppError::InternalServerError(_) => {}
            other => panic!("unexpected mapping: {:?}", other),
        }
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        match AppError::from(sqlx::Error::RowNotFound) {
            AppError::NotFound(_) => {}
            other => panic!("unexpected mapping: {:?}", other),
        }
    }
}
