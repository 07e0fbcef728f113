//! LogTransport - logs messages via tracing instead of sending them

use contracts::{ContractError, MulticastReport, PushMessage, PushTransport, SendResponse};
use tracing::{info, instrument};

/// Transport for dry runs: every token counts as delivered
pub struct LogTransport {
    name: String,
}

impl LogTransport {
    /// Create a new LogTransport with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for LogTransport {
    fn default() -> Self {
        Self::new("log")
    }
}

impl PushTransport for LogTransport {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_transport_send",
        skip(self, message),
        fields(transport = %self.name, tokens = message.tokens.len())
    )]
    async fn send_multicast(&self, message: &PushMessage) -> Result<MulticastReport, ContractError> {
        info!(
            transport = %self.name,
            title = %message.notification.title,
            body = %message.notification.body,
            data = ?message.data,
            idempotency_key = ?message.idempotency_key,
            tokens = message.tokens.len(),
            "Push message (dry run)"
        );

        Ok(MulticastReport::new(
            message
                .tokens
                .iter()
                .map(|token| SendResponse::delivered(token.clone(), None))
                .collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{Metadata, Notification};

    #[tokio::test]
    async fn test_log_transport_delivers_every_token() {
        let transport = LogTransport::new("dry");
        let message = PushMessage::new(
            vec!["a".into(), "b".into()],
            Notification::new("t", "b"),
            &Metadata::new(),
        );

        let report = transport.send_multicast(&message).await.unwrap();
        assert_eq!(report.success_count(), 2);
        assert_eq!(transport.name(), "dry");
    }
}
