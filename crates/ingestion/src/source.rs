//! JSON-lines change event source
//!
//! One `ChangeEvent` per line. Blank lines are skipped; malformed lines are
//! logged, counted and skipped so one bad record never stalls the stream.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use async_channel::Sender;
use contracts::ChangeEvent;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, trace, warn};

use crate::config::IngestionMetrics;
use crate::error::{IngestionError, Result};

/// Boxed line reader
pub type EventReader = Box<dyn AsyncBufRead + Unpin + Send>;

/// Where change events come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventInput {
    /// Standard input
    Stdin,
    /// JSON-lines file
    File(PathBuf),
}

impl EventInput {
    /// Open the input for line reading
    pub async fn open(&self) -> Result<EventReader> {
        match self {
            Self::Stdin => Ok(Box::new(BufReader::new(tokio::io::stdin()))),
            Self::File(path) => {
                let file = tokio::fs::File::open(path)
                    .await
                    .map_err(|source| IngestionError::Open {
                        path: path.clone(),
                        source,
                    })?;
                Ok(Box::new(BufReader::new(file)))
            }
        }
    }
}

impl FromStr for EventInput {
    type Err = std::convert::Infallible;

    /// `-` selects stdin, anything else is a file path
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "-" => Self::Stdin,
            path => Self::File(PathBuf::from(path)),
        })
    }
}

impl fmt::Display for EventInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdin => write!(f, "stdin"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Parse one JSON line into a change event
pub fn parse_line(line_no: u64, line: &str) -> Result<ChangeEvent> {
    serde_json::from_str(line).map_err(|e| IngestionError::ParseFailed {
        line: line_no,
        message: e.to_string(),
    })
}

/// Read events until end of input, the event limit, or the receiver closes
///
/// Returns the number of events this reader forwarded.
pub(crate) async fn forward_events<R>(
    source_name: &str,
    reader: R,
    tx: Sender<ChangeEvent>,
    metrics: Arc<IngestionMetrics>,
    max_events: Option<u64>,
) -> Result<u64>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut line_no = 0u64;
    let mut forwarded = 0u64;

    loop {
        if max_events.is_some_and(|max| metrics.forwarded() >= max) {
            debug!(source = source_name, "event limit reached");
            break;
        }

        let Some(line) = lines
            .next_line()
            .await
            .map_err(|source| IngestionError::Read {
                source_name: source_name.to_string(),
                source,
            })?
        else {
            break;
        };
        line_no += 1;

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        metrics.record_line();

        let event = match parse_line(line_no, trimmed) {
            Ok(event) => event,
            Err(e) => {
                metrics.record_parse_error();
                warn!(source = source_name, error = %e, "skipping malformed event");
                continue;
            }
        };

        trace!(source = source_name, kind = event.kind_label(), path = %event.tx_ref(), "event read");
        if tx.send(event).await.is_err() {
            debug!(source = source_name, "receiver closed, stopping reader");
            return Err(IngestionError::ChannelClosed);
        }
        metrics.record_forwarded();
        metrics.update_queue_len(tx.len());
        forwarded += 1;
    }

    Ok(forwarded)
}
