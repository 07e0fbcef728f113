//! PushTransport trait - Dispatcher output interface
//!
//! Defines the abstract interface for push delivery.

use crate::{ContractError, MulticastReport, PushMessage};

/// Push delivery trait
///
/// All transport implementations must implement this trait.
#[trait_variant::make(PushTransport: Send)]
pub trait LocalPushTransport {
    /// Transport name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Deliver one message to every token in `message.tokens`
    ///
    /// Per-token rejections are reported in the returned `MulticastReport`.
    ///
    /// # Errors
    /// Only transport-level failures (service unreachable, credentials
    /// refused) are returned as errors.
    async fn send_multicast(&self, message: &PushMessage)
        -> Result<MulticastReport, ContractError>;
}
