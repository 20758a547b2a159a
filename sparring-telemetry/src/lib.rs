//! # Sparring Telemetry
//!
//! Crate for logging, log sinks and metrics.

pub mod logging;
pub mod metrics;
pub mod sink;

pub use logging::EventLogger;
pub use metrics::MetricsRecorder;
pub use sink::{FileSink, LogSink, MemorySink, TeeSink, TracingSink};
