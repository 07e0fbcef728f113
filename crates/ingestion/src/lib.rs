//! # Ingestion Pipeline
//!
//! Change event ingestion module.
//!
//! Responsibilities:
//! - Read JSON-lines change events from files or stdin
//! - Skip and count malformed lines
//! - Backpressure through a bounded channel
//! - Send to downstream via async-channel
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{EventInput, IngestionPipeline};
//!
//! let mut pipeline = IngestionPipeline::new(100);
//! let rx = pipeline.take_receiver().unwrap();
//! pipeline.start_input(&EventInput::Stdin).await?;
//! pipeline.close();
//!
//! while let Ok(event) = rx.recv().await {
//!     // Dispatch event
//! }
//! ```

mod config;
mod error;
mod pipeline;
mod source;

// Re-exports
pub use config::{IngestionConfig, IngestionMetrics, MetricsSnapshot};
pub use contracts::ChangeEvent;
pub use error::{IngestionError, Result};
pub use pipeline::IngestionPipeline;
pub use source::{parse_line, EventInput, EventReader};
