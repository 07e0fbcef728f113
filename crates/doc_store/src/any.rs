//! Runtime-selected document store

use contracts::{ContractError, DocumentStore, Group, StoreConfig, StoreType};
use tracing::{info, warn};

use crate::error::Result;
use crate::firestore::{FirestoreConfig, FirestoreStore};
use crate::memory::MemoryStore;

/// Store chosen by configuration
pub enum AnyStore {
    Firestore(FirestoreStore),
    Memory(MemoryStore),
}

impl AnyStore {
    /// Build the store described by `config`
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        match config.store_type {
            StoreType::Firestore => {
                let resolved = FirestoreConfig::from_store_config(config)?;
                if resolved.access_token.is_none() {
                    warn!(
                        env = %config.access_token_env,
                        "Firestore access token not set, sending unauthenticated requests"
                    );
                }
                info!(project_id = %resolved.project_id, database = %resolved.database, "Using Firestore store");
                Ok(Self::Firestore(FirestoreStore::new(resolved)?))
            }
            StoreType::Memory => match &config.snapshot_path {
                Some(path) => {
                    info!(path = %path.display(), "Using memory store from snapshot");
                    Ok(Self::Memory(MemoryStore::from_path(path)?))
                }
                None => {
                    info!("Using empty memory store");
                    Ok(Self::Memory(MemoryStore::new()))
                }
            },
        }
    }

    /// Store kind for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Firestore(_) => "firestore",
            Self::Memory(_) => "memory",
        }
    }
}

impl DocumentStore for AnyStore {
    async fn get_group(&self, group_id: &str) -> std::result::Result<Option<Group>, ContractError> {
        match self {
            Self::Firestore(store) => store.get_group(group_id).await,
            Self::Memory(store) => store.get_group(group_id).await,
        }
    }

    async fn list_token_ids(&self, uid: &str) -> std::result::Result<Vec<String>, ContractError> {
        match self {
            Self::Firestore(store) => store.list_token_ids(uid).await,
            Self::Memory(store) => store.list_token_ids(uid).await,
        }
    }
}
