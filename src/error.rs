//! Error types for recordforge operations.
//!
//! Defines error types for each subsystem:
//! - Completion service interactions
//! - Response validation
//! - Per-item generation outcomes
//! - Record persistence
//! - Startup configuration

use thiserror::Error;

/// Errors that can occur during LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Missing API base URL: LITELLM_API_BASE environment variable not set")]
    MissingApiBase,

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Failed to parse LLM response: {0}")]
    ParseError(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("API error ({code}): {message}")]
    ApiError { code: u16, message: String },

    #[error("Completion contained no content")]
    EmptyCompletion,
}

/// Reasons a completion was rejected by the response validator.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("Output is not valid {format}: {message}")]
    Parse { format: String, message: String },

    #[error("Missing required fields: {}", .missing.join(", "))]
    MissingFields { missing: Vec<String> },

    #[error("Constraint violation: {0}")]
    Constraint(String),
}

impl ValidationError {
    /// Returns the missing field names for a `MissingFields` error.
    pub fn missing_fields(&self) -> Option<&[String]> {
        match self {
            ValidationError::MissingFields { missing } => Some(missing),
            _ => None,
        }
    }
}

/// Errors that can occur while writing a record to disk.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize record as {format}: {message}")]
    Serialize { format: String, message: String },

    #[error("Failed to move record into place at '{path}': {message}")]
    Persist { path: String, message: String },
}

/// Terminal and intermediate outcomes of generating a single record.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Failed to build prompt: {0}")]
    Prompt(#[from] ConfigError),

    #[error("Completion service error: {0}")]
    Completion(#[from] LlmError),

    #[error("All {attempts} attempts failed; last error: {last_error}")]
    ExhaustedRetries {
        attempts: u32,
        last_error: String,
        last_output: String,
    },

    #[error("Persistence failed: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Generation abandoned: batch deadline exceeded")]
    DeadlineExceeded,
}

/// Errors raised while resolving configuration at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(String),

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("Unknown domain '{0}'")]
    UnknownDomain(String),

    #[error("Domain '{domain}' does not support output format '{format}'")]
    UnsupportedFormat { domain: String, format: String },

    #[error("Prompt template error: {0}")]
    Template(String),
}
