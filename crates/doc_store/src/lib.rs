//! # Doc Store
//!
//! Read access to the document database.
//!
//! Responsibilities:
//! - Fetch group membership (`groups/{groupId}`)
//! - List endpoint tokens (`users/{uid}/fcmTokens`)
//! - Select Firestore or in-memory backend from configuration

pub mod any;
pub mod error;
pub mod firestore;
pub mod memory;

pub use any::AnyStore;
pub use contracts::{DocumentStore, Group};
pub use error::{Result, StoreError};
pub use firestore::{FirestoreConfig, FirestoreStore};
pub use memory::{MemoryConfig, MemoryStore, StoreSnapshot};
