//! ## sparring-engine::runner
//! **Executes one test case**
//!
//! Every client of a case gets its own `ClientConnection` and its own timeline
//! task, all anchored to the same `CaseClock`:
//!
//! ```text
//! anchor ──connectTime──▶ connect() ──writeTime──▶ send(message)
//!                             │
//!                             └──disconnectTime──▶ disconnect()
//! ```
//!
//! The case always lasts exactly `connectionTimeout`. At that point pending
//! timeline steps are abandoned, surviving clients are force-disconnected and
//! every actor is joined before the `CaseResult` is assembled.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use opentelemetry::KeyValue;
use parking_lot::Mutex;
use tokio::task::JoinSet;
use tokio::time::{self, Instant};
use tracing::{debug, info, info_span, instrument, warn, Instrument};

use sparring_client::{ClientConnection, ConnectionOptions};
use sparring_config::{ClientOptions, ClientSpec, Settings, TestCase};
use sparring_core::events::render_payload;
use sparring_core::{CaseClock, CaseResult};
use sparring_telemetry::{EventLogger, LogSink, MetricsRecorder};

use crate::manual::LineSource;

/// Clients still owned by their timelines, by position in the case.
type LiveClients = Arc<Mutex<BTreeMap<usize, Arc<ClientConnection>>>>;

/// A client's schedule, resolved from its `ClientSpec`.
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    /// Offset from the case anchor at which the connect attempt starts.
    pub connect_at: Duration,
    /// Offset from connect completion at which the message is sent.
    /// `None` when this client never writes.
    pub write_after: Option<Duration>,
    /// Offset from connect completion at which the client disconnects.
    pub disconnect_after: Duration,
}

impl Timeline {
    /// Resolves a client's schedule. A write is planned only for a non-empty
    /// message that is due no later than the disconnect, and never when
    /// `scheduled_writes` is off (manual cases).
    pub fn plan(spec: &ClientSpec, scheduled_writes: bool) -> Self {
        let write_delay = spec.write_delay();
        let disconnect_after = spec.disconnect_delay();
        let write_after = (scheduled_writes && spec.writes() && write_delay <= disconnect_after)
            .then_some(write_delay);

        Self {
            connect_at: spec.connect_delay(),
            write_after,
            disconnect_after,
        }
    }
}

fn connection_options(options: &ClientOptions) -> ConnectionOptions {
    ConnectionOptions {
        connect_timeout: options.connect_timeout(),
        write_timeout: options.write_timeout(),
        keepalive: options.keepalive(),
        resend_on_keepalive: options.resend_on_keepalive,
        read_buffer_size: options.read_buffer_size,
    }
}

pub struct ScenarioRunner {
    target: String,
    options: ConnectionOptions,
    sink: Arc<dyn LogSink>,
    metrics: MetricsRecorder,
}

impl ScenarioRunner {
    pub fn new(
        target: impl Into<String>,
        options: ConnectionOptions,
        sink: Arc<dyn LogSink>,
        metrics: MetricsRecorder,
    ) -> Self {
        Self {
            target: target.into(),
            options,
            sink,
            metrics,
        }
    }

    /// Runner for the target and client options of a loaded scenario file.
    pub fn from_settings(
        settings: &Settings,
        sink: Arc<dyn LogSink>,
        metrics: MetricsRecorder,
    ) -> Self {
        Self::new(
            settings.target(),
            connection_options(&settings.client),
            sink,
            metrics,
        )
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn metrics(&self) -> &MetricsRecorder {
        &self.metrics
    }

    pub(crate) fn log(&self, line: &str) {
        self.sink.log(line);
    }

    /// Runs `case` with every write and disconnect on its schedule.
    #[instrument(skip_all, fields(case = %case.name))]
    pub async fn run(&self, case: &TestCase) -> CaseResult {
        self.execute(case, None).await
    }

    /// Runs `case` with writes taken from `input` instead of the schedule.
    ///
    /// Lines are requested round-robin from every connected client whose
    /// input is still open; `exit` closes a client's input. Connects,
    /// disconnects and the ceiling behave exactly as in `run`.
    #[instrument(skip_all, fields(case = %case.name))]
    pub async fn run_manual(&self, case: &TestCase, input: &mut dyn LineSource) -> CaseResult {
        self.execute(case, Some(input)).await
    }

    async fn execute(&self, case: &TestCase, input: Option<&mut dyn LineSource>) -> CaseResult {
        self.sink.log(&format!("Test Case: {}", case.name));
        info!(clients = case.clients.len(), timeout = ?case.timeout(), "Starting test case");

        let clock = CaseClock::start();
        let deadline = Instant::from_std(clock.at(case.timeout()));
        let scheduled_writes = input.is_none();

        let live: LiveClients = Arc::default();
        let mut clients = Vec::with_capacity(case.clients.len());
        let mut timelines = JoinSet::new();

        for (index, spec) in case.clients.iter().enumerate() {
            let client = Arc::new(ClientConnection::spawn(
                spec.client_name.clone(),
                self.target.clone(),
                clock,
                self.options.clone(),
                self.sink.clone(),
                self.metrics.clone(),
            ));
            live.lock().insert(index, client.clone());
            clients.push(client.clone());

            let step = TimelineStep {
                index,
                client,
                message: Bytes::from(spec.message.clone()),
                plan: Timeline::plan(spec, scheduled_writes),
                clock,
                live: live.clone(),
                sink: self.sink.clone(),
            };
            let span = info_span!("timeline", client = %spec.client_name);
            timelines.spawn(step.run().instrument(span));
        }

        if let Some(input) = input {
            if time::timeout_at(deadline, self.forward_input(&clients, input))
                .await
                .is_err()
            {
                debug!("Manual input interrupted by the case ceiling");
            }
        }

        time::sleep_until(deadline).await;

        let mut errors = Vec::new();
        timelines.abort_all();
        while let Some(joined) = timelines.join_next().await {
            if let Err(e) = joined {
                if !e.is_cancelled() {
                    errors.push(format!("timeline task failed: {e}"));
                }
            }
        }

        let survivors: Vec<_> = std::mem::take(&mut *live.lock()).into_values().collect();
        for client in &survivors {
            self.sink
                .log(&format!("Disconnecting client {}...", client.name()));
            client.disconnect();
        }

        let mut reports = Vec::with_capacity(clients.len());
        for client in &clients {
            match client.finish().await {
                Ok(report) => reports.push(report),
                Err(e) => errors.push(format!("{}: {e}", client.name())),
            }
        }
        for client in &survivors {
            self.sink
                .log(&format!("Client {} disconnected", client.name()));
        }

        let elapsed = clock.elapsed();
        self.sink.log(&format!(
            "All operations completed for test case: {}",
            case.name
        ));

        let result = CaseResult::new(case.name.clone(), elapsed, reports, errors);
        self.metrics.cases.inc();
        self.metrics.case_seconds.inc_by(elapsed.as_secs_f64());
        EventLogger::log_event(
            "case_complete",
            vec![
                KeyValue::new("case", case.name.clone()),
                KeyValue::new("clients", result.clients.len() as i64),
                KeyValue::new("errors", result.errors.len() as i64),
                KeyValue::new("elapsed_ms", elapsed.as_millis() as i64),
            ],
        )
        .await;
        result
    }

    async fn forward_input(&self, clients: &[Arc<ClientConnection>], input: &mut dyn LineSource) {
        let mut open: Vec<&Arc<ClientConnection>> = clients.iter().collect();

        while !open.is_empty() {
            let mut index = 0;
            while index < open.len() {
                let client = open[index];
                if !client.settled().await {
                    open.remove(index);
                    continue;
                }

                let prompt = format!("{}> ", client.name());
                let line = match input.read_line(&prompt).await {
                    Ok(Some(line)) => line,
                    Ok(None) => return,
                    Err(e) => {
                        warn!(error = %e, "Manual input failed");
                        return;
                    }
                };

                if line.trim() == "exit" {
                    open.remove(index);
                    continue;
                }
                self.sink.log(&format!(
                    "Client {} wrote message: {line}",
                    client.name()
                ));
                client.send(line);
                index += 1;
            }
        }
    }
}

/// Everything one client's timeline task needs.
struct TimelineStep {
    index: usize,
    client: Arc<ClientConnection>,
    message: Bytes,
    plan: Timeline,
    clock: CaseClock,
    live: LiveClients,
    sink: Arc<dyn LogSink>,
}

impl TimelineStep {
    async fn run(self) {
        let name = self.client.name().to_owned();

        time::sleep_until(Instant::from_std(self.clock.at(self.plan.connect_at))).await;
        self.sink.log(&format!("Connecting client {name}..."));
        let connected = self.client.connect().await;
        let connect_done = Instant::now();

        if let (true, Some(after)) = (connected, self.plan.write_after) {
            time::sleep_until(connect_done + after).await;
            self.sink.log(&format!(
                "Client {name} wrote message: {}",
                render_payload(&self.message)
            ));
            self.client.send(self.message.clone());
        }

        time::sleep_until(connect_done + self.plan.disconnect_after).await;
        if self.live.lock().remove(&self.index).is_none() {
            return;
        }
        self.sink.log(&format!("Disconnecting client {name}..."));
        self.client.disconnect();
        self.client.closed().await;
        self.sink.log(&format!("Client {name} disconnected"));
    }
}
