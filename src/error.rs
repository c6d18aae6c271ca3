//! Error types for SeedWork
//!
//! Convention violations are never errors: they are reported as
//! [`Violation`](crate::check::Violation)s. `Error` covers the things that
//! stop a pass outright.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// SeedWork errors
#[derive(Error, Debug)]
pub enum Error {
    #[error("Code parse error: {0}")]
    CodeParse(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Fix error: {0}")]
    Fix(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Analysis pass was cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_norway::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

impl From<minijinja::Error> for Error {
    fn from(e: minijinja::Error) -> Self {
        Error::Render(e.to_string())
    }
}
