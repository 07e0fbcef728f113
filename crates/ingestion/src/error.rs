//! Ingestion error types

use std::path::PathBuf;

use thiserror::Error;

/// Ingestion error
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Event input could not be opened
    #[error("failed to open event input {path}: {source}")]
    Open {
        /// Input path
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading from the input failed
    #[error("failed to read events from {source_name}: {source}")]
    Read {
        /// Input name
        source_name: String,
        #[source]
        source: std::io::Error,
    },

    /// Line is not a valid change event
    #[error("line {line}: invalid change event: {message}")]
    ParseFailed {
        /// 1-based line number
        line: u64,
        /// Error message
        message: String,
    },

    /// Downstream receiver is gone
    #[error("event channel closed")]
    ChannelClosed,
}

/// Ingestion Result type alias
pub type Result<T> = std::result::Result<T, IngestionError>;
