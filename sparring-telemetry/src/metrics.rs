//! ## sparring-telemetry::metrics
//! **Prometheus counters for connection activity**
//!
//! One recorder is shared (cheaply cloned) by every client actor and runner
//! of a process. Counters only ever go up; the text exposition can be
//! rendered at any point with `gather_metrics`.

use prometheus::{Counter, Histogram, HistogramOpts, IntCounter, Registry};

#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    pub registry: Registry,
    pub connects: IntCounter,
    pub connect_failures: IntCounter,
    pub writes: IntCounter,
    pub bytes_sent: IntCounter,
    pub bytes_received: IntCounter,
    pub disconnects: IntCounter,
    pub cases: IntCounter,
    pub case_seconds: Counter,
    pub connect_latency: Histogram,
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self::try_new().expect("metric definitions are static and valid")
    }

    fn try_new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let connects = IntCounter::new("sparring_connects_total", "Successful TCP connects")?;
        let connect_failures = IntCounter::new(
            "sparring_connect_failures_total",
            "Connect attempts that failed or timed out",
        )?;
        let writes = IntCounter::new("sparring_writes_total", "Messages written")?;
        let bytes_sent = IntCounter::new("sparring_bytes_sent_total", "Payload bytes written")?;
        let bytes_received =
            IntCounter::new("sparring_bytes_received_total", "Payload bytes read")?;
        let disconnects =
            IntCounter::new("sparring_disconnects_total", "Connections released")?;
        let cases = IntCounter::new("sparring_cases_total", "Test cases executed")?;
        let case_seconds = Counter::new(
            "sparring_case_seconds_total",
            "Wall-clock seconds spent executing test cases",
        )?;
        let connect_latency = Histogram::with_opts(
            HistogramOpts::new(
                "sparring_connect_latency_seconds",
                "Time from connect attempt to established connection",
            )
            .buckets(vec![0.000_5, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        )?;

        registry.register(Box::new(connects.clone()))?;
        registry.register(Box::new(connect_failures.clone()))?;
        registry.register(Box::new(writes.clone()))?;
        registry.register(Box::new(bytes_sent.clone()))?;
        registry.register(Box::new(bytes_received.clone()))?;
        registry.register(Box::new(disconnects.clone()))?;
        registry.register(Box::new(cases.clone()))?;
        registry.register(Box::new(case_seconds.clone()))?;
        registry.register(Box::new(connect_latency.clone()))?;

        Ok(Self {
            registry,
            connects,
            connect_failures,
            writes,
            bytes_sent,
            bytes_received,
            disconnects,
            cases,
            case_seconds,
            connect_latency,
        })
    }

    pub fn gather_metrics(&self) -> Result<String, prometheus::Error> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::<u8>::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    pub fn record_write(&self, len: usize) {
        self.writes.inc();
        self.bytes_sent.inc_by(len as u64);
    }

    pub fn record_read(&self, len: usize) {
        self.bytes_received.inc_by(len as u64);
    }
}
