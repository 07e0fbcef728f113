//! DocumentStore trait - read side of the document database
//!
//! The dispatcher only ever reads: group membership and endpoint tokens.

use crate::{ContractError, Group};

/// Document store read interface
///
/// Implementations must be safe to call concurrently through `&self`;
/// token lookups for all members of a group run at the same time.
#[trait_variant::make(DocumentStore: Send)]
pub trait LocalDocumentStore {
    /// Fetch `groups/{group_id}`
    ///
    /// Returns `Ok(None)` when the document does not exist.
    async fn get_group(&self, group_id: &str) -> Result<Option<Group>, ContractError>;

    /// List the document ids under `users/{uid}/fcmTokens`
    ///
    /// A user without tokens yields an empty list, not an error.
    async fn list_token_ids(&self, uid: &str) -> Result<Vec<String>, ContractError>;
}
