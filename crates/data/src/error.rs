//! Data-layer error types.

use std::path::PathBuf;
use thiserror::Error;

/// A malformed action record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("record {index} is missing required field `{field}`")]
    MissingField { index: usize, field: &'static str },

    #[error("record {index} has unsupported event `{event}`")]
    UnknownEvent { index: usize, event: String },

    #[error("record {index} has invalid timestamp `{value}`")]
    InvalidTimestamp { index: usize, value: String },
}

/// Errors raised while loading a dataset.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed dataset: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Record(#[from] RecordError),

    #[error("invalid dataset field `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },
}
