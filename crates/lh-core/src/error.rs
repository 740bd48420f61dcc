//! Error types for lihe.

use thiserror::Error;

/// lihe error type.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// An event source met input it cannot turn into an event.
    #[error("malformed input in {origin} at {position}: {message}")]
    MalformedInput {
        /// File name or table the input came from.
        origin: String,
        /// Human-readable position (`line 12`, `row 7`, `column 'rec_i'`).
        position: String,
        /// What was wrong.
        message: String,
    },

    /// Invalid configuration (bad axis, duplicate name, unknown cut, ...).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Lookup of a fill that was not registered in the run.
    #[error("fill not found: {0}")]
    FillNotFound(String),

    /// A cut or projection could not be evaluated on an event.
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// A result was requested from a pass that has not consumed the whole source.
    #[error("pass is not complete; result would be partial")]
    IncompletePass,

    /// Arrow / Parquet failure while loading columnar input.
    #[error("columnar input error: {0}")]
    Columnar(String),
}

impl Error {
    /// Shorthand for [`Error::MalformedInput`].
    pub fn malformed(
        origin: impl Into<String>,
        position: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Error::MalformedInput {
            origin: origin.into(),
            position: position.into(),
            message: message.into(),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
