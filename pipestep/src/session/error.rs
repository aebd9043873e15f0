//! Session error types

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised by a compute session
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("No partition {info_date} in table {table}")]
    PartitionNotFound { table: String, info_date: NaiveDate },

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed row in {path} line {line}: {source}")]
    MalformedRow {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported file system: {0}")]
    UnsupportedFileSystem(String),
}

impl SessionError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SessionError::Io {
            path: path.into(),
            source,
        }
    }
}
