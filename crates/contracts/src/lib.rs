//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the notifier:
//! transaction records, change events, push messages, the two collaborator
//! traits (`DocumentStore`, `PushTransport`) and the service configuration.
//! Business crates depend on this crate only; reverse dependencies are
//! prohibited.
//!
//! ## Document Model
//! - Transactions live at `groups/{groupId}/tx/{txId}`
//! - Groups carry a `memberUids` list
//! - Endpoint tokens are the document ids under `users/{uid}/fcmTokens`

mod config;
pub mod display;
mod error;
mod event;
mod message;
mod record;
mod store;
mod transport;
mod tx_ref;

pub use config::*;
pub use display::{DisplayedNotification, DEFAULT_DISPLAY_TITLE};
pub use error::*;
pub use event::ChangeEvent;
pub use message::*;
pub use record::*;
pub use store::{DocumentStore, LocalDocumentStore};
pub use transport::{LocalPushTransport, PushTransport};
pub use tx_ref::TxRef;
