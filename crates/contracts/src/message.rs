//! Push message and multicast report
//!
//! `PushMessage` is what the dispatcher hands to a `PushTransport`;
//! `MulticastReport` is what comes back, one entry per token.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::format_number;

/// Structured metadata before coercion to text
pub type Metadata = BTreeMap<String, Value>;

/// User-visible part of a push notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

impl Notification {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

/// One multicast delivery request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushMessage {
    /// Endpoint tokens to address
    pub tokens: Vec<String>,

    /// Title and body
    pub notification: Notification,

    /// String-typed key/value payload
    pub data: BTreeMap<String, String>,

    /// Key under which the delivery ecosystem may collapse duplicates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

impl PushMessage {
    /// Build a message, coercing every metadata value to text.
    pub fn new(tokens: Vec<String>, notification: Notification, metadata: &Metadata) -> Self {
        Self {
            tokens,
            notification,
            data: stringify_metadata(metadata),
            idempotency_key: None,
        }
    }

    /// Attach an idempotency key
    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }
}

/// Coerce all metadata values to their textual form.
pub fn stringify_metadata(metadata: &Metadata) -> BTreeMap<String, String> {
    metadata
        .iter()
        .map(|(k, v)| (k.clone(), stringify_value(v)))
        .collect()
}

/// Textual form of a JSON value: strings verbatim, numbers without a
/// spurious `.0`, booleans and null as literals, containers as compact JSON.
pub fn stringify_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i.to_string(),
            (_, Some(u), _) => u.to_string(),
            (_, _, Some(f)) => format_number(f),
            _ => n.to_string(),
        },
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Per-token delivery result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum SendOutcome {
    /// Accepted by the push service
    Delivered {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message_id: Option<String>,
    },
    /// Rejected for this token only (stale, unregistered, invalid)
    Failed { code: String, message: String },
}

/// Delivery result for one token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendResponse {
    pub token: String,
    #[serde(flatten)]
    pub outcome: SendOutcome,
}

impl SendResponse {
    pub fn delivered(token: impl Into<String>, message_id: Option<String>) -> Self {
        Self {
            token: token.into(),
            outcome: SendOutcome::Delivered { message_id },
        }
    }

    pub fn failed(
        token: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            token: token.into(),
            outcome: SendOutcome::Failed {
                code: code.into(),
                message: message.into(),
            },
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self.outcome, SendOutcome::Delivered { .. })
    }
}

/// Result of one multicast request, in token order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MulticastReport {
    pub responses: Vec<SendResponse>,
}

impl MulticastReport {
    pub fn new(responses: Vec<SendResponse>) -> Self {
        Self { responses }
    }

    pub fn success_count(&self) -> usize {
        self.responses.iter().filter(|r| r.is_delivered()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.responses.len() - self.success_count()
    }

    /// Tokens the push service rejected
    pub fn failed_tokens(&self) -> impl Iterator<Item = &str> {
        self.responses
            .iter()
            .filter(|r| !r.is_delivered())
            .map(|r| r.token.as_str())
    }
}
