//! RecordingTransport - in-memory transport for tests and local runs
//!
//! Keeps every message it is given. Can reject chosen tokens or refuse
//! every request to exercise failure paths.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use contracts::{ContractError, MulticastReport, PushMessage, PushTransport, SendResponse};
use tracing::instrument;

/// Transport that records messages instead of sending them
#[derive(Default)]
pub struct RecordingTransport {
    messages: Mutex<Vec<PushMessage>>,
    rejected_tokens: HashSet<String>,
    unavailable: bool,
    latency: Option<Duration>,
}

impl RecordingTransport {
    /// Accept every token
    pub fn new() -> Self {
        Self::default()
    }

    /// Report the given tokens as unregistered
    pub fn rejecting<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rejected_tokens: tokens.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Fail every request at the transport level
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Default::default()
        }
    }

    /// Delay every request
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Messages received so far, in arrival order
    pub fn messages(&self) -> Vec<PushMessage> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl PushTransport for RecordingTransport {
    fn name(&self) -> &str {
        "recording"
    }

    #[instrument(name = "recording_transport_send", skip(self, message), fields(tokens = message.tokens.len()))]
    async fn send_multicast(&self, message: &PushMessage) -> Result<MulticastReport, ContractError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.unavailable {
            return Err(ContractError::transport("recording", "service unavailable"));
        }

        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.clone());

        Ok(MulticastReport::new(
            message
                .tokens
                .iter()
                .map(|token| {
                    if self.rejected_tokens.contains(token) {
                        SendResponse::failed(
                            token.clone(),
                            "UNREGISTERED",
                            "Requested entity was not found.",
                        )
                    } else {
                        SendResponse::delivered(token.clone(), Some(format!("msg-{token}")))
                    }
                })
                .collect(),
        ))
    }
}
