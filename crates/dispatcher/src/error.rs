//! Dispatcher error types

use thiserror::Error;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Transport could not be built from configuration
    #[error("failed to create transport '{name}': {message}")]
    TransportCreation { name: String, message: String },

    /// Event handling exceeded its deadline
    #[error("event {path} exceeded deadline of {timeout_ms} ms")]
    Deadline { path: String, timeout_ms: u64 },

    /// Event task panicked or was cancelled
    #[error("event task for {path} aborted: {message}")]
    TaskAborted { path: String, message: String },

    /// Store or transport failure (from contract)
    #[error(transparent)]
    Contract(#[from] contracts::ContractError),
}

impl DispatcherError {
    /// Create a transport creation error
    pub fn transport_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TransportCreation {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Short label for logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            Self::TransportCreation { .. } => "transport_creation",
            Self::Deadline { .. } => "deadline",
            Self::TaskAborted { .. } => "aborted",
            Self::Contract(contracts::ContractError::Store { .. }) => "store_error",
            Self::Contract(contracts::ContractError::Transport { .. }) => "transport_error",
            Self::Contract(_) => "error",
        }
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, DispatcherError>;
