// src/error.rs

//! Error types for pkgrepo
//!
//! Only failures a caller has to act on are surfaced here. Build failures,
//! index tool failures and staleness check failures are recorded as state
//! (or logged) at their own boundary instead.

use thiserror::Error;

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed
    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    /// Filesystem or process I/O failed
    #[error("I/O error: {0}")]
    IoError(String),

    /// Database or directory initialization failed
    #[error("Initialization error: {0}")]
    InitError(String),

    /// A named entity does not exist
    #[error("Not found: {0}")]
    NotFoundError(String),

    /// An entity with the same identity already exists
    #[error("Conflict: {0}")]
    ConflictError(String),

    /// A value could not be parsed
    #[error("Parse error: {0}")]
    ParseError(String),

    /// The build description of a base package is missing or unusable
    #[error("Metadata error: {0}")]
    MetadataError(String),

    /// The request violates a repository or model rule
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The configuration file could not be read or parsed
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A required external tool is not installed
    #[error("Tool not found: {0}")]
    ToolNotFound(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err.to_string())
    }
}

impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Self {
        Error::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::IoError(format!("JSON serialization failed: {}", err))
    }
}
