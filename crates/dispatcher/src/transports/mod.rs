//! Push transport implementations

mod any;
mod fcm;
mod log;
mod recording;

pub use any::AnyTransport;
pub use fcm::{FcmConfig, FcmTransport};
pub use log::LogTransport;
pub use recording::RecordingTransport;
