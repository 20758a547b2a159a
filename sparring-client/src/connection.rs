//! ## sparring-client::connection
//! **Handle onto one client actor**
//!
//! The handle never touches the socket. It holds:
//! - the command queue into the actor (processed strictly in order)
//! - the outbound message slot (replaced atomically as a whole `Bytes`)
//! - a watch on the actor's lifecycle state
//!
//! A write request snapshots the slot at request time, so a concurrent
//! `set_message` can never produce a torn or mixed payload on the wire.

use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info_span, Instrument};

use sparring_core::{CaseClock, ClientError, ClientReport, ClientState};
use sparring_telemetry::{LogSink, MetricsRecorder};

use crate::actor::{ClientActor, Command};
use crate::options::ConnectionOptions;

#[derive(Debug, Error)]
pub enum FinishError {
    #[error("client {0} was already finished")]
    AlreadyFinished(String),

    #[error("client task failed: {0}")]
    Task(#[from] JoinError),
}

pub struct ClientConnection {
    name: Arc<str>,
    commands: mpsc::UnboundedSender<Command>,
    outbound: watch::Sender<Option<Bytes>>,
    state: watch::Receiver<ClientState>,
    actor: Mutex<Option<JoinHandle<ClientReport>>>,
    sink: Arc<dyn LogSink>,
}

impl ClientConnection {
    /// Spawns the actor for a client targeting `addr`. The client starts
    /// `Idle`; nothing touches the network until `connect` is called.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(
        name: impl Into<String>,
        addr: impl Into<String>,
        clock: CaseClock,
        options: ConnectionOptions,
        sink: Arc<dyn LogSink>,
        metrics: MetricsRecorder,
    ) -> Self {
        let name: String = name.into();
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ClientState::Idle);
        let (outbound_tx, outbound_rx) = watch::channel(None);

        let shared_name: Arc<str> = Arc::from(name.as_str());
        let actor = ClientActor {
            name: shared_name.clone(),
            addr: addr.into(),
            clock,
            options,
            sink: sink.clone(),
            metrics,
            commands: command_rx,
            state: state_tx,
            outbound: outbound_rx,
            report: ClientReport::new(name.clone()),
        };
        let span = info_span!("client", name = %name);
        let handle = tokio::spawn(actor.run().instrument(span));

        Self {
            name: shared_name,
            commands: command_tx,
            outbound: outbound_tx,
            state: state_rx,
            actor: Mutex::new(Some(handle)),
            sink,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> ClientState {
        *self.state.borrow()
    }

    /// Starts the single connect attempt and waits for its outcome.
    ///
    /// Returns `true` once connected, `false` if the attempt failed, timed
    /// out, was abandoned, or the client is already disconnected.
    pub async fn connect(&self) -> bool {
        if self.commands.send(Command::Connect).is_err() {
            return false;
        }
        self.settled().await
    }

    /// Waits until the connect attempt has an outcome, without starting one.
    /// Returns whether the client is connected at that point.
    pub async fn settled(&self) -> bool {
        let mut state = self.state.clone();
        let connected = match state
            .wait_for(|s| matches!(s, ClientState::Connected | ClientState::Disconnected))
            .await
        {
            Ok(reached) => *reached == ClientState::Connected,
            Err(_) => false,
        };
        connected
    }

    /// Replaces the outbound message. Later writes send the new value.
    pub fn set_message(&self, message: impl Into<Bytes>) {
        self.outbound.send_replace(Some(message.into()));
    }

    /// The current outbound message, if one was ever set.
    pub fn message(&self) -> Option<Bytes> {
        self.outbound.borrow().clone()
    }

    /// Queues a write of the current outbound message. Completion is
    /// asynchronous; the outcome shows up in the client's log and report.
    /// Returns `false` if the client is already disconnected.
    pub fn write(&self) -> bool {
        let snapshot = self.message();
        if self.commands.send(Command::Write(snapshot)).is_err() {
            self.sink.log(&format!(
                "[{}] Write skipped: {}",
                self.name,
                ClientError::NotConnected
            ));
            return false;
        }
        true
    }

    /// `set_message` followed by `write`.
    pub fn send(&self, message: impl Into<Bytes>) -> bool {
        self.set_message(message);
        self.write()
    }

    /// Asks the actor to close the connection. Safe to call any number of
    /// times and from any state.
    pub fn disconnect(&self) {
        if self.commands.send(Command::Disconnect).is_err() {
            debug!(client = %self.name, "Disconnect on a finished client ignored");
        }
    }

    /// Resolves once the client has reached `Disconnected`.
    pub async fn closed(&self) {
        let mut state = self.state.clone();
        // An error means the actor is gone, which implies disconnected.
        let _ = state.wait_for(|s| s.is_terminal()).await;
    }

    /// Waits for the actor to finish and hands back its report. Does not
    /// disconnect by itself; call `disconnect` first to force the close.
    pub async fn finish(&self) -> Result<ClientReport, FinishError> {
        let handle = self.actor.lock().take();
        match handle {
            Some(handle) => Ok(handle.await?),
            None => Err(FinishError::AlreadyFinished(self.name.to_string())),
        }
    }
}
