//! Configuration validation
//!
//! Rules:
//! - field ranges and non-empty names (validator derive)
//! - remote store / transport need a project id
//! - base URLs are http(s)
//! - memory snapshot path, when given, is not empty

use contracts::{ContractError, NotifierConfig, StoreType, TransportType};
use ::validator::Validate;

/// Validate NotifierConfig
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(config: &NotifierConfig) -> Result<(), ContractError> {
    validate_fields(config)?;
    validate_store(config)?;
    validate_transport(config)?;
    Ok(())
}

/// Derive-based field checks
fn validate_fields(config: &NotifierConfig) -> Result<(), ContractError> {
    config
        .validate()
        .map_err(|e| ContractError::config_validation("config", e.to_string().trim().to_string()))
}

/// Store cross-field checks
fn validate_store(config: &NotifierConfig) -> Result<(), ContractError> {
    let store = &config.store;
    match store.store_type {
        StoreType::Firestore => {
            require_project_id("store.project_id", store.project_id.as_deref())?;
            require_http_url("store.base_url", &store.base_url)?;
            if store.database.is_empty() {
                return Err(ContractError::config_validation(
                    "store.database",
                    "database cannot be empty",
                ));
            }
        }
        StoreType::Memory => {
            if let Some(path) = &store.snapshot_path {
                if path.as_os_str().is_empty() {
                    return Err(ContractError::config_validation(
                        "store.snapshot_path",
                        "snapshot_path cannot be empty",
                    ));
                }
            }
        }
    }
    Ok(())
}

/// Transport cross-field checks
fn validate_transport(config: &NotifierConfig) -> Result<(), ContractError> {
    let transport = &config.transport;
    if transport.transport_type == TransportType::Fcm {
        require_project_id("transport.project_id", transport.project_id.as_deref())?;
        require_http_url("transport.base_url", &transport.base_url)?;
    }
    Ok(())
}

fn require_project_id(field: &str, project_id: Option<&str>) -> Result<(), ContractError> {
    match project_id {
        Some(id) if !id.trim().is_empty() => Ok(()),
        _ => Err(ContractError::config_validation(
            field,
            "project_id is required and cannot be empty",
        )),
    }
}

fn require_http_url(field: &str, url: &str) -> Result<(), ContractError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(ContractError::config_validation(
            field,
            format!("'{url}' is not an http(s) URL"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote_config() -> NotifierConfig {
        let mut config = NotifierConfig::default();
        config.store.store_type = StoreType::Firestore;
        config.store.project_id = Some("splitnest".into());
        config.transport.transport_type = TransportType::Fcm;
        config.transport.project_id = Some("splitnest".into());
        config
    }

    #[test]
    fn test_valid_config() {
        assert!(validate(&NotifierConfig::default()).is_ok());
        assert!(validate(&remote_config()).is_ok());
    }

    #[test]
    fn test_firestore_without_project() {
        let mut config = remote_config();
        config.store.project_id = Some("  ".into());
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("store.project_id"), "got: {err}");
    }

    #[test]
    fn test_fcm_without_project() {
        let mut config = remote_config();
        config.transport.project_id = None;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("transport.project_id"), "got: {err}");
    }

    #[test]
    fn test_bad_base_url() {
        let mut config = remote_config();
        config.transport.base_url = "fcm.googleapis.com".into();
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("not an http(s) URL"), "got: {err}");
    }

    #[test]
    fn test_zero_concurrency() {
        let mut config = NotifierConfig::default();
        config.dispatch.max_concurrent_events = 0;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("max_concurrent_events"), "got: {err}");
    }

    #[test]
    fn test_empty_app_name() {
        let mut config = NotifierConfig::default();
        config.app.name = String::new();
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("app name cannot be empty"), "got: {err}");
    }
}
