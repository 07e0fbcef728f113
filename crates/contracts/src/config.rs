//! NotifierConfig - Config Loader output
//!
//! Describes the full service configuration: app identity, document store,
//! push transport and dispatch limits. Credentials never live here; the
//! config names the environment variables that hold them.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use validator::Validate;

use crate::{DEFAULT_DISPLAY_TITLE, EXPENSE_KIND};

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct NotifierConfig {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// App identity
    #[serde(default)]
    #[validate(nested)]
    pub app: AppConfig,

    /// Document store
    #[serde(default)]
    #[validate(nested)]
    pub store: StoreConfig,

    /// Push transport
    #[serde(default)]
    #[validate(nested)]
    pub transport: TransportConfig,

    /// Dispatch limits
    #[serde(default)]
    #[validate(nested)]
    pub dispatch: DispatchConfig,
}

/// App identity used in notification text
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    /// Title prefix, e.g. "SplitNest" in "SplitNest: Approved"
    #[serde(default = "default_app_name")]
    #[validate(length(min = 1, message = "app name cannot be empty"))]
    pub name: String,

    /// Record kind that triggers notifications
    #[serde(default = "default_expected_kind")]
    #[validate(length(min = 1, message = "expected_kind cannot be empty"))]
    pub expected_kind: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            expected_kind: default_expected_kind(),
        }
    }
}

fn default_app_name() -> String {
    DEFAULT_DISPLAY_TITLE.to_string()
}

fn default_expected_kind() -> String {
    EXPENSE_KIND.to_string()
}

/// Document store type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreType {
    /// Firestore REST API
    Firestore,
    /// In-process store, optionally loaded from a snapshot file
    #[default]
    Memory,
}

/// Document store configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StoreConfig {
    /// Store type
    #[serde(default)]
    pub store_type: StoreType,

    /// Cloud project id (firestore only)
    #[serde(default)]
    pub project_id: Option<String>,

    /// Database id (firestore only)
    #[serde(default = "default_database")]
    pub database: String,

    /// API base URL (firestore only)
    #[serde(default = "default_firestore_url")]
    pub base_url: String,

    /// Environment variable holding the bearer token (firestore only)
    #[serde(default = "default_firestore_token_env")]
    pub access_token_env: String,

    /// Snapshot file with groups and tokens (memory only)
    #[serde(default)]
    pub snapshot_path: Option<PathBuf>,

    /// Documents per list page
    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, max = 300))]
    pub page_size: u32,

    /// Per-request timeout in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    #[validate(range(min = 1))]
    pub request_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            store_type: StoreType::default(),
            project_id: None,
            database: default_database(),
            base_url: default_firestore_url(),
            access_token_env: default_firestore_token_env(),
            snapshot_path: None,
            page_size: default_page_size(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

fn default_database() -> String {
    "(default)".to_string()
}

fn default_firestore_url() -> String {
    "https://firestore.googleapis.com".to_string()
}

fn default_firestore_token_env() -> String {
    "FIRESTORE_ACCESS_TOKEN".to_string()
}

fn default_page_size() -> u32 {
    100
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

/// Push transport type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportType {
    /// Firebase Cloud Messaging HTTP v1
    Fcm,
    /// Log only, every token reported delivered
    #[default]
    Log,
}

/// Push transport configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TransportConfig {
    /// Transport type
    #[serde(default)]
    pub transport_type: TransportType,

    /// Cloud project id (fcm only)
    #[serde(default)]
    pub project_id: Option<String>,

    /// API base URL (fcm only)
    #[serde(default = "default_fcm_url")]
    pub base_url: String,

    /// Environment variable holding the bearer token (fcm only)
    #[serde(default = "default_fcm_token_env")]
    pub access_token_env: String,

    /// Tokens per multicast chunk
    #[serde(default = "default_batch_size")]
    #[validate(range(min = 1, max = 500))]
    pub batch_size: usize,

    /// Concurrent send requests within one chunk
    #[serde(default = "default_max_in_flight")]
    #[validate(range(min = 1))]
    pub max_in_flight: usize,

    /// Per-request timeout in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    #[validate(range(min = 1))]
    pub request_timeout_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            transport_type: TransportType::default(),
            project_id: None,
            base_url: default_fcm_url(),
            access_token_env: default_fcm_token_env(),
            batch_size: default_batch_size(),
            max_in_flight: default_max_in_flight(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

fn default_fcm_url() -> String {
    "https://fcm.googleapis.com".to_string()
}

fn default_fcm_token_env() -> String {
    "FCM_ACCESS_TOKEN".to_string()
}

fn default_batch_size() -> usize {
    500
}

fn default_max_in_flight() -> usize {
    16
}

/// Dispatch limits
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DispatchConfig {
    /// Events handled concurrently
    #[serde(default = "default_max_concurrent_events")]
    #[validate(range(min = 1))]
    pub max_concurrent_events: usize,

    /// Event channel capacity between source and dispatcher
    #[serde(default = "default_channel_capacity")]
    #[validate(range(min = 1))]
    pub channel_capacity: usize,

    /// Per-event deadline in milliseconds (0 = none)
    #[serde(default)]
    pub event_timeout_ms: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_concurrent_events: default_max_concurrent_events(),
            channel_capacity: default_channel_capacity(),
            event_timeout_ms: 0,
        }
    }
}

fn default_max_concurrent_events() -> usize {
    32
}

fn default_channel_capacity() -> usize {
    100
}
