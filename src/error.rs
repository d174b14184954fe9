//! Error types for matrix construction, providers, checkers and configuration.
//!
//! Construction-time errors (`MatrixError`, `ConfigError`) are fatal. Runtime
//! errors (`ProviderError`, `CheckerError`) are isolated by the analyzer and
//! recorded as failed report entries.

use thiserror::Error;

/// Structural errors raised while building a matrix.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatrixError {
    /// The weights table is not square or a row length mismatches the entity count.
    #[error("shape error: {0}")]
    Shape(String),
    /// Categories or entity names do not match the entity index range.
    #[error("label error: {0}")]
    Label(String),
}

/// Errors raised by a provider while producing a matrix.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("cannot read {source_name}: {error}")]
    Io {
        source_name: String,
        #[source]
        error: std::io::Error,
    },
    #[error("malformed data at line {line}: {reason}")]
    Malformed { line: usize, reason: String },
    #[error(transparent)]
    Matrix(#[from] MatrixError),
    #[error("{0}")]
    Unavailable(String),
}

/// Precondition violations detected by a checker at run time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckerError {
    #[error("unknown entity {0:?}")]
    UnknownEntity(String),
    #[error("no entity carries category {0:?}")]
    MissingCategory(String),
    #[error("{0}")]
    Precondition(String),
}

/// Invalid configuration, detected before any analysis runs.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unknown plugin {0:?}")]
    UnknownPlugin(String),
    #[error("{identifier}: {reason}")]
    InvalidArgument { identifier: String, reason: String },
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error("cannot read configuration {path}: {error}")]
    Io {
        path: String,
        #[source]
        error: std::io::Error,
    },
    #[error("cannot parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),
}

impl ConfigError {
    /// Shorthand for an argument binding failure.
    pub fn argument(identifier: &str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidArgument {
            identifier: identifier.to_string(),
            reason: reason.into(),
        }
    }
}
