//! Error types for the catalog services
//!
//! Provides:
//! - Distinct error kinds for the failure modes of the data-access layer
//! - Classification of store errors into conflict / unavailable / not-found
//! - HTTP status code mapping and the uniform `{message, status_code}` body

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::{DbErr, RuntimeErr, SqlErr};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    // Resource errors
    #[error("{resource} with key {key} does not exist")]
    NotFound { resource: String, key: String },

    // Conflict errors
    #[error("Conflict: {message}")]
    Conflict { message: String },

    // Store errors
    #[error("Store unavailable: {message}")]
    Unavailable { message: String },

    #[error("Database error: {0}")]
    Database(DbErr),

    #[error("Invalid persisted data: {message}")]
    InvalidData { message: String },

    // Type resolution
    #[error("Cannot resolve entity type {type_name}: {reason}")]
    TypeResolution { type_name: String, reason: String },

    // Internal errors
    #[error("Internal server error: {message}")]
    Internal { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Shorthand for a missing row of the given resource
    pub fn not_found(resource: impl Into<String>, key: impl std::fmt::Debug) -> Self {
        AppError::NotFound {
            resource: resource.into(),
            key: format!("{:?}", key),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,

            // 404 Not Found
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,

            // 409 Conflict
            AppError::Conflict { .. } => StatusCode::CONFLICT,

            // 500 Internal Server Error
            AppError::Database(_)
            | AppError::InvalidData { .. }
            | AppError::TypeResolution { .. }
            | AppError::Internal { .. }
            | AppError::Configuration { .. }
            | AppError::Serialization(_)
            | AppError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,

            // 503 Service Unavailable
            AppError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Check if this error should be logged at error level
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Check if this error is a client error
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

/// Store errors are classified here so that repositories only ever use `?`.
impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        if let Some(sql_err) = err.sql_err() {
            return match sql_err {
                SqlErr::UniqueConstraintViolation(message) => AppError::Conflict { message },
                SqlErr::ForeignKeyConstraintViolation(message) => AppError::Conflict { message },
                _ => AppError::Database(err),
            };
        }

        match err {
            DbErr::ConnectionAcquire(e) => AppError::Unavailable {
                message: e.to_string(),
            },
            DbErr::Conn(e) => AppError::Unavailable {
                message: e.to_string(),
            },
            DbErr::RecordNotFound(message) => AppError::NotFound {
                resource: "record".to_string(),
                key: message,
            },
            DbErr::RecordNotUpdated => AppError::NotFound {
                resource: "record".to_string(),
                key: "<updated row>".to_string(),
            },
            DbErr::Exec(ref e) | DbErr::Query(ref e) if is_transport_failure(e) => {
                AppError::Unavailable {
                    message: e.to_string(),
                }
            }
            other => AppError::Database(other),
        }
    }
}

/// Driver errors that mean the store could not be reached at all
fn is_transport_failure(err: &RuntimeErr) -> bool {
    use sea_orm::sqlx::Error as SqlxError;

    matches!(
        err,
        RuntimeErr::SqlxError(SqlxError::Io(_))
            | RuntimeErr::SqlxError(SqlxError::PoolTimedOut)
            | RuntimeErr::SqlxError(SqlxError::PoolClosed)
            | RuntimeErr::SqlxError(SqlxError::WorkerCrashed)
    )
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let field = errors.field_errors().keys().next().map(|f| f.to_string());
        AppError::Validation {
            message: errors.to_string(),
            field,
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration {
            message: err.to_string(),
        }
    }
}

/// Uniform error body returned for every failed request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
    pub status_code: u16,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();

        // Log based on severity
        if self.is_server_error() {
            tracing::error!(
                error = %message,
                status = status.as_u16(),
                "Server error"
            );
        } else if self.is_client_error() {
            tracing::warn!(
                error = %message,
                status = status.as_u16(),
                "Client error"
            );
        }

        let body = ErrorResponse {
            message,
            status_code: status.as_u16(),
        };

        (status, Json(body)).into_response()
    }
}
