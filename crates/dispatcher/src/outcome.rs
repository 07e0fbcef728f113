//! What happened to one change event

use std::fmt;

use contracts::MulticastReport;

/// Why an event produced no notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterReason {
    /// Record kind is not the one that triggers notifications
    WrongKind { kind: Option<String> },
    /// Created record is not pending
    NotPending { status: Option<String> },
    /// Update left the status unchanged
    StatusUnchanged,
    /// New status has no notification
    UnhandledStatus { status: Option<String> },
}

impl FilterReason {
    /// Short label for logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            Self::WrongKind { .. } => "wrong_kind",
            Self::NotPending { .. } => "not_pending",
            Self::StatusUnchanged => "status_unchanged",
            Self::UnhandledStatus { .. } => "unhandled_status",
        }
    }
}

impl fmt::Display for FilterReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |v: &Option<String>| v.clone().unwrap_or_else(|| "<missing>".into());
        match self {
            Self::WrongKind { kind } => write!(f, "record kind is {}", show(kind)),
            Self::NotPending { status } => write!(f, "created with status {}", show(status)),
            Self::StatusUnchanged => write!(f, "status unchanged"),
            Self::UnhandledStatus { status } => {
                write!(f, "no notification for status {}", show(status))
            }
        }
    }
}

/// Result of handling one change event
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// Event did not qualify; nothing was read or sent
    Filtered(FilterReason),
    /// Group missing or without members
    EmptyAudience,
    /// Members have no registered tokens
    NoTokens,
    /// One multicast request was made
    Delivered(MulticastReport),
}

impl DispatchOutcome {
    /// Short label for logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            Self::Filtered(_) => "filtered",
            Self::EmptyAudience => "empty_audience",
            Self::NoTokens => "no_tokens",
            Self::Delivered(_) => "delivered",
        }
    }

    /// Delivery report, if a request was made
    pub fn report(&self) -> Option<&MulticastReport> {
        match self {
            Self::Delivered(report) => Some(report),
            _ => None,
        }
    }

    /// Whether a request was made
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered(_))
    }
}
