// src/errors.rs

//! Crate-wide error type for construction-time and configuration failures.
//!
//! Runtime failures of processes and transfers never surface as errors; they
//! are folded into an [`crate::result::ExecutionResult`] at the operation
//! boundary.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunxferError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Duplicate environment variable: {0}")]
    DuplicateEnvKey(String),

    #[error("Invalid URI: {0}")]
    InvalidUri(String),

    #[error("Unsupported URI scheme: {0}")]
    UnsupportedScheme(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, RunxferError>;
