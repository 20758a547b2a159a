//! Structured results handed back up the call chain.

use std::time::Duration;

use super::{ClientEvent, TimedEvent};
use crate::state::ClientState;

/// Everything one client recorded during a case run.
#[derive(Debug, Clone)]
pub struct ClientReport {
    pub name: String,
    pub events: Vec<TimedEvent>,
    pub final_state: ClientState,
}

impl ClientReport {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            events: Vec::new(),
            final_state: ClientState::Idle,
        }
    }

    /// Whether the connect handshake ever succeeded.
    pub fn connected(&self) -> bool {
        self.position(|e| matches!(e, ClientEvent::Connected { .. }))
            .is_some()
    }

    /// Number of writes that made it onto the wire.
    pub fn writes(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e.event, ClientEvent::Sent { .. }))
            .count()
    }

    /// Payloads written, in order.
    pub fn sent_payloads(&self) -> Vec<&[u8]> {
        self.events
            .iter()
            .filter_map(|e| match &e.event {
                ClientEvent::Sent { bytes } => Some(bytes.as_ref()),
                _ => None,
            })
            .collect()
    }

    /// All bytes received, concatenated.
    pub fn received(&self) -> Vec<u8> {
        self.events
            .iter()
            .filter_map(|e| match &e.event {
                ClientEvent::Received { bytes } => Some(bytes.as_ref()),
                _ => None,
            })
            .flatten()
            .copied()
            .collect()
    }

    /// Index of the first event matching `pred`.
    pub fn position(&self, pred: impl Fn(&ClientEvent) -> bool) -> Option<usize> {
        self.events.iter().position(|e| pred(&e.event))
    }

    /// Offset from the case anchor at which the client was released.
    pub fn disconnected_at(&self) -> Option<Duration> {
        self.events
            .iter()
            .rev()
            .find(|e| e.event == ClientEvent::Disconnected)
            .map(|e| e.at)
    }

    pub fn errors(&self) -> impl Iterator<Item = String> + '_ {
        self.events
            .iter()
            .filter(|e| e.event.is_failure())
            .map(move |e| format!("{}: {}", self.name, e.event))
    }
}

/// Outcome of one executed test case.
#[derive(Debug, Clone)]
pub struct CaseResult {
    pub name: String,
    pub elapsed: Duration,
    pub clients: Vec<ClientReport>,
    pub errors: Vec<String>,
}

impl CaseResult {
    /// Builds a result, collecting client failures into `errors` after any
    /// runner-level errors already known.
    pub fn new(
        name: impl Into<String>,
        elapsed: Duration,
        clients: Vec<ClientReport>,
        mut errors: Vec<String>,
    ) -> Self {
        errors.extend(clients.iter().flat_map(|c| c.errors()));
        Self {
            name: name.into(),
            elapsed,
            clients,
            errors,
        }
    }

    pub fn client(&self, name: &str) -> Option<&ClientReport> {
        self.clients.iter().find(|c| c.name == name)
    }

    pub fn passed(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn all_disconnected(&self) -> bool {
        self.clients
            .iter()
            .all(|c| c.final_state == ClientState::Disconnected)
    }
}
