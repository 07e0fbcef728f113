//! Background receiver
//!
//! What a client shows when a push arrives while the app is in the
//! background: only `notification.title` and `notification.body` are
//! surfaced, everything else in the payload is ignored.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::stringify_value;

/// Title shown when the payload carries none
pub const DEFAULT_DISPLAY_TITLE: &str = "SplitNest";

/// System notification as displayed to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayedNotification {
    pub title: String,
    pub body: String,
}

impl DisplayedNotification {
    /// Extract the displayed notification from a received push payload.
    ///
    /// Missing, null, empty, `false` or `0` values fall back to the
    /// defaults (`"SplitNest"` and `""`).
    pub fn from_payload(payload: &Value) -> Self {
        let notification = payload.get("notification");
        let field = |name: &str| notification.and_then(|n| n.get(name)).and_then(present_text);

        Self {
            title: field("title").unwrap_or_else(|| DEFAULT_DISPLAY_TITLE.to_string()),
            body: field("body").unwrap_or_default(),
        }
    }
}

fn present_text(value: &Value) -> Option<String> {
    let blank = match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::Array(_) | Value::Object(_) => false,
    };
    (!blank).then(|| stringify_value(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_title_and_body_from_payload() {
        let shown = DisplayedNotification::from_payload(&json!({
            "notification": {"title": "SplitNest: Approved", "body": "food • 12 approved"},
            "data": {"groupId": "g1"}
        }));
        assert_eq!(shown.title, "SplitNest: Approved");
        assert_eq!(shown.body, "food • 12 approved");
    }

    #[test]
    fn test_defaults_without_notification() {
        let shown = DisplayedNotification::from_payload(&json!({"data": {"x": "1"}}));
        assert_eq!(shown.title, DEFAULT_DISPLAY_TITLE);
        assert_eq!(shown.body, "");
    }

    #[test]
    fn test_blank_values_fall_back() {
        let shown = DisplayedNotification::from_payload(&json!({
            "notification": {"title": "", "body": null}
        }));
        assert_eq!(shown.title, "SplitNest");
        assert_eq!(shown.body, "");
    }
}
