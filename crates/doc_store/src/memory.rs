//! In-memory document store
//!
//! Backs local runs and tests. Supports failure injection and artificial
//! latency so concurrency and error paths can be exercised without a
//! network.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use config_loader::ConfigLoader;
use contracts::{ContractError, DocumentStore, Group};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::StoreError;

/// Store contents as loaded from a snapshot file
///
/// ```json
/// { "groups": { "house": { "memberUids": ["alice", "bob"] } },
///   "tokens": { "alice": ["tok-a1"], "bob": ["tok-b1", "tok-b2"] } }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSnapshot {
    /// Group documents by id
    #[serde(default)]
    pub groups: HashMap<String, Group>,
    /// Token ids by user id
    #[serde(default)]
    pub tokens: HashMap<String, Vec<String>>,
}

/// Memory store behaviour
#[derive(Debug, Default, Clone)]
pub struct MemoryConfig {
    /// Group ids whose lookup fails
    pub fail_groups: Vec<String>,
    /// User ids whose token listing fails
    pub fail_users: Vec<String>,
    /// Delay applied to every read
    pub latency: Option<Duration>,
}

/// In-memory document store
pub struct MemoryStore {
    config: MemoryConfig,
    data: RwLock<StoreSnapshot>,
    lookups: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::with_snapshot(StoreSnapshot::default(), MemoryConfig::default())
    }

    /// Create a store with contents and behaviour
    pub fn with_snapshot(snapshot: StoreSnapshot, config: MemoryConfig) -> Self {
        Self {
            config,
            data: RwLock::new(snapshot),
            lookups: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Load contents from a TOML/JSON snapshot file
    pub fn from_path(path: &Path) -> Result<Self, StoreError> {
        let snapshot: StoreSnapshot = ConfigLoader::load_document(path)?;
        Ok(Self::with_snapshot(snapshot, MemoryConfig::default()))
    }

    /// Insert or replace a group
    pub fn insert_group(&self, group_id: impl Into<String>, group: Group) {
        self.data
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .groups
            .insert(group_id.into(), group);
    }

    /// Replace a user's token ids
    pub fn insert_tokens<I, S>(&self, uid: impl Into<String>, tokens: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.data
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .tokens
            .insert(uid.into(), tokens.into_iter().map(Into::into).collect());
    }

    /// Total reads served (including failed ones)
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    /// Highest number of reads observed in flight at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn enter(&self) -> InFlightGuard<'_> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let guard = InFlightGuard(&self.in_flight);
        if let Some(latency) = self.config.latency {
            tokio::time::sleep(latency).await;
        }
        guard
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore for MemoryStore {
    #[instrument(name = "memory_get_group", skip(self), fields(group_id = %group_id))]
    async fn get_group(&self, group_id: &str) -> Result<Option<Group>, ContractError> {
        let _guard = self.enter().await;
        if self.config.fail_groups.iter().any(|g| g == group_id) {
            return Err(StoreError::Injected {
                operation: "get_group",
                key: group_id.to_string(),
            }
            .into());
        }

        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        Ok(data.groups.get(group_id).cloned())
    }

    #[instrument(name = "memory_list_token_ids", skip(self), fields(uid = %uid))]
    async fn list_token_ids(&self, uid: &str) -> Result<Vec<String>, ContractError> {
        let _guard = self.enter().await;
        if self.config.fail_users.iter().any(|u| u == uid) {
            return Err(StoreError::Injected {
                operation: "list_token_ids",
                key: uid.to_string(),
            }
            .into());
        }

        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        Ok(data.tokens.get(uid).cloned().unwrap_or_default())
    }
}

struct InFlightGuard<'a>(&'a AtomicUsize);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}
