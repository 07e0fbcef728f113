//! Notification text and metadata for each qualifying change
//!
//! Titles are `"{app}: {headline}"`; bodies use the record's category and
//! amount, with `•` between them.

use contracts::{Metadata, Notification, TxRecord, TxRef, TxStatus};
use serde_json::Value;

/// Message content before tokens are known
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    pub notification: Notification,
    pub metadata: Metadata,
    /// `"{txId}:{status}"`
    pub idempotency_key: String,
}

/// "Approval needed" for a newly created pending record
pub fn approval_needed(app_name: &str, tx_ref: &TxRef, record: &TxRecord) -> Draft {
    let notification = Notification::new(
        format!("{app_name}: Approval needed"),
        format!(
            "New pending {} • {}",
            record.category_label(),
            record.amount_label()
        ),
    );

    let mut metadata = base_metadata(tx_ref);
    metadata.insert("path".into(), Value::String(tx_ref.path()));

    Draft {
        notification,
        metadata,
        idempotency_key: idempotency_key(tx_ref, &TxStatus::Pending),
    }
}

/// Decision notice for a record that moved to approved or rejected
///
/// Returns None for any other status.
pub fn decision(app_name: &str, tx_ref: &TxRef, record: &TxRecord) -> Option<Draft> {
    let status = record.status.as_ref()?;
    let headline = match status {
        TxStatus::Approved => "Approved",
        TxStatus::Rejected => "Rejected",
        _ => return None,
    };

    let notification = Notification::new(
        format!("{app_name}: {headline}"),
        format!(
            "{} • {} {}",
            record.category_label(),
            record.amount_label(),
            status.as_str()
        ),
    );

    let mut metadata = base_metadata(tx_ref);
    metadata.insert("status".into(), Value::String(status.as_str().to_string()));

    Some(Draft {
        notification,
        metadata,
        idempotency_key: idempotency_key(tx_ref, status),
    })
}

/// Key identifying one (transaction, status) notification
pub fn idempotency_key(tx_ref: &TxRef, status: &TxStatus) -> String {
    format!("{}:{}", tx_ref.tx_id(), status.as_str())
}

fn base_metadata(tx_ref: &TxRef) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert("groupId".into(), Value::String(tx_ref.group_id().to_string()));
    metadata.insert("txId".into(), Value::String(tx_ref.tx_id().to_string()));
    metadata
}
