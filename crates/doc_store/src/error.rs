//! Document store error types

use contracts::ContractError;
use thiserror::Error;

/// Document store specific error
#[derive(Debug, Error)]
pub enum StoreError {
    /// Request could not be sent or the response body could not be read
    #[error("{operation} request failed: {source}")]
    Request {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// Server answered with a non-success status
    #[error("{operation} returned HTTP {status}: {body}")]
    HttpStatus {
        operation: &'static str,
        status: u16,
        body: String,
    },

    /// Response body is not a valid document
    #[error("{operation} response could not be decoded: {message}")]
    Decode {
        operation: &'static str,
        message: String,
    },

    /// Store could not be built from configuration
    #[error("store configuration error: {message}")]
    Config { message: String },

    /// Failure injected by the in-memory store
    #[error("{operation} failed for '{key}': injected failure")]
    Injected { operation: &'static str, key: String },

    /// Wrapped ContractError
    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl StoreError {
    /// Operation name the error belongs to
    pub fn operation(&self) -> &str {
        match self {
            Self::Request { operation, .. }
            | Self::HttpStatus { operation, .. }
            | Self::Decode { operation, .. }
            | Self::Injected { operation, .. } => operation,
            Self::Config { .. } => "configure",
            Self::Contract(_) => "load",
        }
    }

    /// Create configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

impl From<StoreError> for ContractError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Contract(inner) => inner,
            other => ContractError::store(other.operation().to_string(), other.to_string()),
        }
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, StoreError>;
