//! ChangeEvent - change source output
//!
//! One event per document write under `groups/{groupId}/tx/{txId}`.

use serde::{Deserialize, Serialize};

use crate::{TxRecord, TxRef};

/// Document change event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeEvent {
    /// A transaction document was created
    Created {
        path: TxRef,
        #[serde(default)]
        record: TxRecord,
    },

    /// A transaction document was updated
    Updated {
        path: TxRef,
        #[serde(default)]
        before: TxRecord,
        #[serde(default)]
        after: TxRecord,
    },
}

impl ChangeEvent {
    /// Location of the changed document
    pub fn tx_ref(&self) -> &TxRef {
        match self {
            Self::Created { path, .. } | Self::Updated { path, .. } => path,
        }
    }

    /// Short label for logs and metrics
    pub fn kind_label(&self) -> &'static str {
        match self {
            Self::Created { .. } => "created",
            Self::Updated { .. } => "updated",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TxStatus;

    #[test]
    fn test_created_event_json() {
        let event: ChangeEvent = serde_json::from_str(
            r#"{"kind":"created","path":"groups/g1/tx/t1","record":{"type":"expense","status":"pending"}}"#,
        )
        .unwrap();
        assert_eq!(event.kind_label(), "created");
        assert_eq!(event.tx_ref().tx_id(), "t1");
        match event {
            ChangeEvent::Created { record, .. } => {
                assert_eq!(record.status, Some(TxStatus::Pending))
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_updated_event_missing_sides_default() {
        let event: ChangeEvent =
            serde_json::from_str(r#"{"kind":"updated","path":"groups/g1/tx/t1"}"#).unwrap();
        match event {
            ChangeEvent::Updated { before, after, .. } => {
                assert_eq!(before, TxRecord::default());
                assert_eq!(after, TxRecord::default());
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_bad_path_rejected() {
        let result: Result<ChangeEvent, _> =
            serde_json::from_str(r#"{"kind":"created","path":"users/u1"}"#);
        assert!(result.is_err());
    }
}
