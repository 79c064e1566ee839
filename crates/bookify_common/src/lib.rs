// Declare modules within this crate
pub mod error; // Error taxonomy
pub mod http; // HTTP utilities
pub mod logging; // Logging utilities
pub mod services; // Service abstractions

// Re-export error types and utilities for easier access
pub use error::{
    config_error, external_service_error, internal_error, not_found, persistence_error,
    validation_error, BookifyError, HttpStatusCode,
};

// Re-export HTTP utilities for easier access
pub use http::{client::HTTP_CLIENT, handle_json_result, IntoHttpResponse};
