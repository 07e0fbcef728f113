//! TxRef - location of a transaction document
//!
//! Parsed from `groups/{groupId}/tx/{txId}`; serialized back to the same path.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::ContractError;

/// Marker separating a fully-qualified Firestore name from its relative path.
const DOCUMENTS_MARKER: &str = "/documents/";

/// Reference to a transaction document.
///
/// # Examples
/// ```
/// use contracts::TxRef;
///
/// let tx: TxRef = "groups/g1/tx/t9".parse().unwrap();
/// assert_eq!(tx.group_id(), "g1");
/// assert_eq!(tx.tx_id(), "t9");
/// assert_eq!(tx.path(), "groups/g1/tx/t9");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TxRef {
    group_id: String,
    tx_id: String,
}

impl TxRef {
    /// Create a reference from its two identifiers.
    pub fn new(group_id: impl Into<String>, tx_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            tx_id: tx_id.into(),
        }
    }

    /// Owning group id
    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    /// Transaction id
    pub fn tx_id(&self) -> &str {
        &self.tx_id
    }

    /// Relative document path
    pub fn path(&self) -> String {
        format!("groups/{}/tx/{}", self.group_id, self.tx_id)
    }

    /// Parse a relative path, or a fully-qualified
    /// `projects/{p}/databases/{d}/documents/...` name.
    pub fn parse(path: &str) -> Result<Self, ContractError> {
        let relative = match path.find(DOCUMENTS_MARKER) {
            Some(idx) => &path[idx + DOCUMENTS_MARKER.len()..],
            None => path,
        };
        let segments: Vec<&str> = relative.trim_matches('/').split('/').collect();

        match segments.as_slice() {
            ["groups", group_id, "tx", tx_id] if !group_id.is_empty() && !tx_id.is_empty() => {
                Ok(Self::new(*group_id, *tx_id))
            }
            _ => Err(ContractError::invalid_path(
                path,
                "expected groups/{groupId}/tx/{txId}",
            )),
        }
    }
}

impl fmt::Display for TxRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "groups/{}/tx/{}", self.group_id, self.tx_id)
    }
}

impl FromStr for TxRef {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for TxRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.path())
    }
}

impl<'de> Deserialize<'de> for TxRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
