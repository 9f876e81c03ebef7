//! Error type for the fallible surfaces of the crate.
//!
//! The search engines themselves never fail; they report an [`Outcome`](crate::Outcome).
//! Errors only arise when loading instances, reading configuration or
//! validating tours handed in from outside.

use thiserror::Error;

/// Errors raised while loading problems, configurations or tours.
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("unsupported instance: {0}")]
    Unsupported(String),

    #[error("invalid tour: {0}")]
    InvalidTour(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;
