use std::fmt;
use thiserror::Error;

/// The base error type shared across the Bookify crates.
///
/// Feature crates define their own `thiserror` enums and convert into this
/// taxonomy at the HTTP boundary.
#[derive(Error, Debug)]
pub enum BookifyError {
    /// Missing or malformed required input.
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Missing, invalid or expired credential. The message is deliberately
    /// generic so it does not leak which check failed.
    #[error("Unauthorized")]
    AuthError,

    /// Unknown resource id.
    #[error("Not found: {0}")]
    NotFoundError(String),

    /// Calendar or mail provider failure. On the booking path this is never
    /// surfaced to the caller; it triggers the fallback path instead.
    #[error("External service error: {service_name} - {message}")]
    ExternalServiceError {
        service_name: String,
        message: String,
    },

    /// Store unavailable. Surfaced as 503 on the login path, logged and
    /// continued elsewhere.
    #[error("Persistence error: {0}")]
    PersistenceError(String),

    /// Missing or invalid configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// A trait for converting errors to HTTP status codes.
pub trait HttpStatusCode {
    fn status_code(&self) -> u16;
}

impl HttpStatusCode for BookifyError {
    fn status_code(&self) -> u16 {
        match self {
            BookifyError::ValidationError(_) => 400,
            BookifyError::AuthError => 401,
            BookifyError::NotFoundError(_) => 404,
            BookifyError::ExternalServiceError { .. } => 502,
            BookifyError::PersistenceError(_) => 503,
            BookifyError::ConfigError(_) => 500,
            BookifyError::InternalError(_) => 500,
        }
    }
}

pub fn validation_error<T: fmt::Display>(message: T) -> BookifyError {
    BookifyError::ValidationError(message.to_string())
}

pub fn not_found<T: fmt::Display>(message: T) -> BookifyError {
    BookifyError::NotFoundError(message.to_string())
}

pub fn external_service_error<T: fmt::Display>(service_name: &str, message: T) -> BookifyError {
    BookifyError::ExternalServiceError {
        service_name: service_name.to_string(),
        message: message.to_string(),
    }
}

pub fn persistence_error<T: fmt::Display>(message: T) -> BookifyError {
    BookifyError::PersistenceError(message.to_string())
}

pub fn config_error<T: fmt::Display>(message: T) -> BookifyError {
    BookifyError::ConfigError(message.to_string())
}

pub fn internal_error<T: fmt::Display>(message: T) -> BookifyError {
    BookifyError::InternalError(message.to_string())
}

impl From<reqwest::Error> for BookifyError {
    fn from(err: reqwest::Error) -> Self {
        BookifyError::ExternalServiceError {
            service_name: "http".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for BookifyError {
    fn from(err: serde_json::Error) -> Self {
        BookifyError::InternalError(err.to_string())
    }
}

impl From<std::io::Error> for BookifyError {
    fn from(err: std::io::Error) -> Self {
        BookifyError::InternalError(err.to_string())
    }
}
