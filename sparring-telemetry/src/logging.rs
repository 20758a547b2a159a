//! ## sparring-telemetry::logging
//! **Structured logging with tracing and OpenTelemetry attributes**
//!
//! Console output for the whole harness goes through a single `tracing`
//! subscriber. `RUST_LOG` takes precedence over the configured level.

use opentelemetry::KeyValue;
use tracing::{info_span, Instrument};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Clone)]
pub struct EventLogger;

impl EventLogger {
    /// Installs the global subscriber. Calling it twice is harmless; the
    /// second call is ignored.
    pub fn init(default_level: &str) {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(default_level))
            .unwrap_or_else(|_| EnvFilter::new("info"));

        let _ = fmt()
            .with_env_filter(filter)
            .with_thread_names(true)
            .with_target(false)
            .try_init();
    }

    /// Emits a structured event inside a span named after `event_type`.
    pub async fn log_event(event_type: &str, metadata: Vec<KeyValue>) {
        let span = info_span!("harness_event", event_type = event_type, otel.kind = "INTERNAL");

        async {
            tracing::info!(metadata = ?metadata, "Harness event recorded");
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[traced_test]
    #[test]
    fn test_logging() {
        tokio::runtime::Runtime::new()
            .unwrap()
            .block_on(EventLogger::log_event(
                "case_complete",
                vec![KeyValue::new("case", "basic")],
            ));
        assert!(logs_contain("Harness event recorded"));
        assert!(logs_contain("case_complete"));
    }
}
