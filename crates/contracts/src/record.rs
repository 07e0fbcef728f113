//! Transaction record and group documents

use serde::{Deserialize, Serialize};
use std::fmt;

/// Record kind that triggers notifications
pub const EXPENSE_KIND: &str = "expense";

/// Category label used when a record has none
pub const DEFAULT_CATEGORY: &str = "expense";

/// Transaction status
///
/// Unrecognized values are preserved verbatim so that transitions between
/// two different unknown statuses are still distinguishable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TxStatus {
    /// Awaiting approval
    Pending,
    /// Approved by the group
    Approved,
    /// Rejected by the group
    Rejected,
    /// Any other value
    Other(String),
}

impl TxStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for TxStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "pending" => Self::Pending,
            "approved" => Self::Approved,
            "rejected" => Self::Rejected,
            _ => Self::Other(s),
        }
    }
}

impl From<&str> for TxStatus {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<TxStatus> for String {
    fn from(status: TxStatus) -> Self {
        match status {
            TxStatus::Other(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Expense-like transaction document (`groups/{groupId}/tx/{txId}`)
///
/// Every field is optional on the wire; missing fields never fail parsing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TxRecord {
    /// Record kind tag, e.g. "expense"
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Approval status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TxStatus>,

    /// Free-form category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Amount in the group's currency
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
}

impl TxRecord {
    /// Build a record of the given kind and status
    pub fn new(kind: impl Into<String>, status: TxStatus) -> Self {
        Self {
            kind: Some(kind.into()),
            status: Some(status),
            ..Default::default()
        }
    }

    /// Set category
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Set amount
    pub fn with_amount(mut self, amount: f64) -> Self {
        self.amount = Some(amount);
        self
    }

    /// Whether the record's kind tag equals `kind`
    pub fn is_kind(&self, kind: &str) -> bool {
        self.kind.as_deref() == Some(kind)
    }

    /// Category for display; empty or missing falls back to "expense"
    pub fn category_label(&self) -> &str {
        match self.category.as_deref() {
            Some(c) if !c.is_empty() => c,
            _ => DEFAULT_CATEGORY,
        }
    }

    /// Amount for display; missing renders as `0`
    pub fn amount_label(&self) -> String {
        format_number(self.amount.unwrap_or(0.0))
    }
}

/// Render a number the way a JSON document author wrote it:
/// integral values without a fractional part, others in shortest form.
/// Magnitudes from 1e21 up or below 1e-6 use exponent form (`1e+21`, `1e-7`).
pub fn format_number(value: f64) -> String {
    if value == 0.0 || value.is_nan() {
        return "0".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    let magnitude = value.abs();
    if !(1e-6..1e21).contains(&magnitude) {
        let formatted = format!("{value:e}");
        return match formatted.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{mantissa}e+{exponent}")
            }
            _ => formatted,
        };
    }

    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}

/// Group document (`groups/{groupId}`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Member user ids
    #[serde(rename = "memberUids", default)]
    pub member_uids: Vec<String>,
}

impl Group {
    pub fn new<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            member_uids: members.into_iter().map(Into::into).collect(),
        }
    }
}
