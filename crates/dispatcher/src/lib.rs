//! # Dispatcher
//!
//! Change-triggered notification fan-out.
//!
//! Responsibilities:
//! - Filter record changes that warrant a notification
//! - Resolve the owning group's members and their endpoint tokens
//! - Build the notification and send one multicast per event
//! - Run events concurrently with bounded parallelism

pub mod dispatcher;
pub mod error;
pub mod message;
pub mod metrics;
pub mod outcome;
pub mod runner;
pub mod transports;

pub use contracts::{ChangeEvent, DocumentStore, PushTransport};
pub use dispatcher::{DispatcherSettings, FanoutDispatcher};
pub use error::{DispatcherError, Result};
pub use message::Draft;
pub use metrics::{DispatchMetrics, MetricsSnapshot};
pub use outcome::{DispatchOutcome, FilterReason};
pub use runner::{EventObserver, EventReport, EventRunner, RunnerSettings};
pub use transports::{AnyTransport, FcmConfig, FcmTransport, LogTransport, RecordingTransport};
