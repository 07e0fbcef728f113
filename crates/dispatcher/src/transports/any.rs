//! Runtime-selected push transport

use contracts::{
    ContractError, MulticastReport, PushMessage, PushTransport, TransportConfig, TransportType,
};
use tracing::{info, instrument, warn};

use super::{FcmConfig, FcmTransport, LogTransport};
use crate::error::DispatcherError;

/// Transport chosen by configuration
pub enum AnyTransport {
    Fcm(FcmTransport),
    Log(LogTransport),
}

impl AnyTransport {
    /// Build the transport described by `config`
    ///
    /// `dry_run` forces the log transport regardless of the configured type.
    #[instrument(name = "transport_from_config", skip(config), fields(transport_type = ?config.transport_type))]
    pub fn from_config(config: &TransportConfig, dry_run: bool) -> Result<Self, DispatcherError> {
        if dry_run {
            info!("Dry run, messages are logged instead of sent");
            return Ok(Self::Log(LogTransport::new("dry-run")));
        }

        match config.transport_type {
            TransportType::Fcm => {
                let resolved = FcmConfig::from_transport_config(config)?;
                if resolved.access_token.is_none() {
                    warn!(
                        env = %config.access_token_env,
                        "FCM access token not set, requests will be unauthenticated"
                    );
                }
                info!(project_id = %resolved.project_id, "Using FCM transport");
                Ok(Self::Fcm(FcmTransport::new(resolved)?))
            }
            TransportType::Log => Ok(Self::Log(LogTransport::default())),
        }
    }
}

impl PushTransport for AnyTransport {
    fn name(&self) -> &str {
        match self {
            Self::Fcm(transport) => transport.name(),
            Self::Log(transport) => transport.name(),
        }
    }

    async fn send_multicast(&self, message: &PushMessage) -> Result<MulticastReport, ContractError> {
        match self {
            Self::Fcm(transport) => transport.send_multicast(message).await,
            Self::Log(transport) => transport.send_multicast(message).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dry_run_overrides_fcm() {
        let config = TransportConfig {
            transport_type: TransportType::Fcm,
            ..Default::default()
        };
        let transport = AnyTransport::from_config(&config, true).unwrap();
        assert_eq!(transport.name(), "dry-run");
    }

    #[test]
    fn test_fcm_requires_project() {
        let config = TransportConfig {
            transport_type: TransportType::Fcm,
            ..Default::default()
        };
        assert!(AnyTransport::from_config(&config, false).is_err());
    }

    #[test]
    fn test_default_is_log() {
        let transport = AnyTransport::from_config(&TransportConfig::default(), false).unwrap();
        assert_eq!(transport.name(), "log");
    }
}
