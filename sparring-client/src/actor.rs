//! The task that owns a client's socket.
//!
//! All socket I/O for one client happens here, so reads, writes and the close
//! can never race each other. The loop only reacts to three things: a command
//! from the handle, bytes (or EOF) from the peer, and the keepalive timer.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, warn};

use sparring_core::events::render_payload;
use sparring_core::{CaseClock, ClientError, ClientEvent, ClientReport, ClientState, TimedEvent};
use sparring_telemetry::{LogSink, MetricsRecorder};

use crate::options::ConnectionOptions;

#[derive(Debug)]
pub(crate) enum Command {
    Connect,
    /// Snapshot of the outbound slot taken when the write was requested.
    Write(Option<Bytes>),
    Disconnect,
}

/// Why the connected loop ended.
enum Close {
    Requested,
    PeerClosed,
    Failed,
}

pub(crate) struct ClientActor {
    pub(crate) name: Arc<str>,
    pub(crate) addr: String,
    pub(crate) clock: CaseClock,
    pub(crate) options: ConnectionOptions,
    pub(crate) sink: Arc<dyn LogSink>,
    pub(crate) metrics: MetricsRecorder,
    pub(crate) commands: mpsc::UnboundedReceiver<Command>,
    pub(crate) state: watch::Sender<ClientState>,
    pub(crate) outbound: watch::Receiver<Option<Bytes>>,
    pub(crate) report: ClientReport,
}

impl ClientActor {
    pub(crate) async fn run(mut self) -> ClientReport {
        if !self.wait_for_connect().await {
            self.record(ClientEvent::DisconnectRequested);
            self.log("Disconnect requested before connecting; nothing to close.");
            return self.release();
        }

        if let Some(stream) = self.establish().await {
            let reason = self.serve(stream).await;
            debug!(
                client = %self.name,
                peer_closed = matches!(reason, Close::PeerClosed),
                failed = matches!(reason, Close::Failed),
                "Connected loop finished"
            );
        }
        self.release()
    }

    /// Idle: waits for the first `Connect`. Returns false when the client is
    /// disconnected (or dropped) before ever connecting.
    async fn wait_for_connect(&mut self) -> bool {
        loop {
            match self.commands.recv().await {
                Some(Command::Connect) => return true,
                Some(Command::Write(_)) => self.skip_write(&ClientError::NotConnected.to_string()),
                Some(Command::Disconnect) | None => return false,
            }
        }
    }

    /// Connecting: one attempt, bounded by the connect timeout. A disconnect
    /// arriving meanwhile abandons the attempt.
    async fn establish(&mut self) -> Option<TcpStream> {
        self.transition(ClientState::Connecting);
        self.record(ClientEvent::ConnectAttempt);
        self.log(&format!("Connecting to {}...", self.addr));

        let started = Instant::now();
        let attempt = time::timeout(
            self.options.connect_timeout,
            TcpStream::connect(self.addr.clone()),
        );
        tokio::pin!(attempt);

        let outcome = loop {
            tokio::select! {
                result = &mut attempt => break Some(result),
                cmd = self.commands.recv() => match cmd {
                    Some(Command::Write(_)) => self.skip_write("still connecting"),
                    Some(Command::Connect) => debug!(client = %self.name, "Already connecting"),
                    Some(Command::Disconnect) | None => break None,
                },
            }
        };

        let error = match outcome {
            Some(Ok(Ok(stream))) => {
                self.metrics.connects.inc();
                self.metrics
                    .connect_latency
                    .observe(started.elapsed().as_secs_f64());
                let local = stream.local_addr().ok();
                self.record(ClientEvent::Connected { local });
                self.transition(ClientState::Connected);
                self.log("Connected to server.");
                return Some(stream);
            }
            Some(Ok(Err(source))) => ClientError::ConnectFailure {
                addr: self.addr.clone(),
                source,
            },
            Some(Err(_)) => ClientError::ConnectTimeout {
                addr: self.addr.clone(),
                timeout: self.options.connect_timeout,
            },
            None => {
                self.record(ClientEvent::DisconnectRequested);
                self.log("Disconnect requested while connecting; attempt abandoned.");
                return None;
            }
        };

        self.metrics.connect_failures.inc();
        self.log(&format!("Connect error: {error}"));
        warn!(client = %self.name, error = %error, "Connect failed");
        self.record(ClientEvent::ConnectFailed {
            error: error.to_string(),
        });
        None
    }

    /// Connected: reads, writes and keepalive ticks until something closes
    /// the connection. Always half-closes the write side before returning.
    async fn serve(&mut self, stream: TcpStream) -> Close {
        let (mut reader, mut writer) = stream.into_split();
        let mut buf = vec![0u8; self.options.read_buffer_size.max(1)];
        // Writes requested while another write was still in flight.
        let mut backlog = VecDeque::new();

        // `interval` rejects a zero period.
        let period = self.options.keepalive.max(Duration::from_millis(1));
        let mut keepalive = time::interval_at(time::Instant::now() + period, period);
        keepalive.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let reason = loop {
            if let Some(payload) = backlog.pop_front() {
                match self.write(&mut writer, payload, &mut backlog).await {
                    Ok(()) => continue,
                    Err(stop) => break stop,
                }
            }

            tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    Some(Command::Write(payload)) => {
                        if let Err(stop) = self.write(&mut writer, payload, &mut backlog).await {
                            break stop;
                        }
                    }
                    Some(Command::Connect) => debug!(client = %self.name, "Already connected"),
                    Some(Command::Disconnect) | None => {
                        self.record(ClientEvent::DisconnectRequested);
                        break Close::Requested;
                    }
                },
                read = reader.read(&mut buf) => match read {
                    Ok(0) => {
                        self.record(ClientEvent::PeerClosed);
                        self.log("Connection closed by peer.");
                        break Close::PeerClosed;
                    }
                    Ok(n) => {
                        let bytes = Bytes::copy_from_slice(&buf[..n]);
                        self.metrics.record_read(n);
                        self.log(&format!("Received message: {}", render_payload(&bytes)));
                        self.record(ClientEvent::Received { bytes });
                    }
                    Err(e) => {
                        let error = ClientError::ReadFailure(e);
                        self.log(&format!("Read error: {error}"));
                        self.record(ClientEvent::ReadFailed { error: error.to_string() });
                        break Close::Failed;
                    }
                },
                _ = keepalive.tick() => {
                    self.record(ClientEvent::KeepaliveTick);
                    if self.options.resend_on_keepalive {
                        let payload = self.outbound.borrow().clone();
                        if payload.as_ref().is_some_and(|p| !p.is_empty()) {
                            if let Err(stop) = self.write(&mut writer, payload, &mut backlog).await {
                                break stop;
                            }
                        }
                    }
                }
            }
        };

        if let Err(e) = writer.shutdown().await {
            debug!(client = %self.name, error = %e, "Half-close failed");
        }
        reason
    }

    /// Sends one payload, bounded by the write timeout.
    ///
    /// Commands keep being served while the payload is in flight: further
    /// writes are queued on `backlog` and a disconnect drops the write on the
    /// spot. Returns why the connection has to close, if it does.
    async fn write(
        &mut self,
        writer: &mut OwnedWriteHalf,
        payload: Option<Bytes>,
        backlog: &mut VecDeque<Option<Bytes>>,
    ) -> Result<(), Close> {
        let bytes = match payload {
            Some(bytes) if !bytes.is_empty() => bytes,
            _ => {
                self.skip_write("no message set");
                return Ok(());
            }
        };

        let outcome = {
            let send = time::timeout(self.options.write_timeout, writer.write_all(&bytes));
            tokio::pin!(send);
            loop {
                tokio::select! {
                    result = &mut send => break Some(result),
                    cmd = self.commands.recv() => match cmd {
                        Some(Command::Write(next)) => backlog.push_back(next),
                        Some(Command::Connect) => debug!(client = %self.name, "Already connected"),
                        Some(Command::Disconnect) | None => break None,
                    },
                }
            }
        };

        let error = match outcome {
            Some(Ok(Ok(()))) => {
                self.metrics.record_write(bytes.len());
                self.log(&format!("Sent message: {}", render_payload(&bytes)));
                self.record(ClientEvent::Sent { bytes });
                return Ok(());
            }
            Some(Ok(Err(e))) => ClientError::WriteFailure(e),
            Some(Err(_)) => ClientError::WriteTimeout(self.options.write_timeout),
            None => {
                self.log("Write abandoned: disconnect requested.");
                self.record(ClientEvent::WriteAbandoned);
                self.record(ClientEvent::DisconnectRequested);
                return Err(Close::Requested);
            }
        };

        self.log(&format!("Write error: {error}"));
        self.record(ClientEvent::WriteFailed {
            error: error.to_string(),
        });
        Err(Close::Failed)
    }

    fn skip_write(&mut self, reason: &str) {
        self.log(&format!("Write skipped: {reason}"));
        self.record(ClientEvent::WriteSkipped {
            reason: reason.to_owned(),
        });
    }

    /// Terminal step shared by every path out of the actor.
    fn release(mut self) -> ClientReport {
        self.commands.close();
        self.metrics.disconnects.inc();
        self.record(ClientEvent::Disconnected);
        self.transition(ClientState::Disconnected);
        self.log("Disconnected.");
        self.report
    }

    fn transition(&mut self, next: ClientState) {
        let current = *self.state.borrow();
        debug_assert!(
            current.can_transition_to(next),
            "illegal transition {current} -> {next}"
        );
        self.report.final_state = next;
        self.state.send_replace(next);
    }

    fn record(&mut self, event: ClientEvent) {
        self.report
            .events
            .push(TimedEvent::new(self.clock.elapsed(), event));
    }

    fn log(&self, line: &str) {
        self.sink.log(&format!("[{}] {line}", self.name));
    }
}
