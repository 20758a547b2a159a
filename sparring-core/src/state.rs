//! Client lifecycle.
//!
//! `Idle -> Connecting -> Connected -> Disconnected`. `Disconnected` is
//! terminal: a new logical connection needs a new client.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientState {
    Idle,
    Connecting,
    Connected,
    Disconnected,
}

impl ClientState {
    /// Whether `next` is a legal successor of `self`.
    pub fn can_transition_to(self, next: ClientState) -> bool {
        use ClientState::*;
        matches!(
            (self, next),
            (Idle, Connecting)
                | (Idle, Disconnected)
                | (Connecting, Connected)
                | (Connecting, Disconnected)
                | (Connected, Disconnected)
        )
    }

    #[inline]
    pub fn is_terminal(self) -> bool {
        self == ClientState::Disconnected
    }
}

impl fmt::Display for ClientState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ClientState::Idle => "idle",
            ClientState::Connecting => "connecting",
            ClientState::Connected => "connected",
            ClientState::Disconnected => "disconnected",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::ClientState::*;
    use super::*;

    #[test]
    fn forward_transitions_are_legal() {
        assert!(Idle.can_transition_to(Connecting));
        assert!(Connecting.can_transition_to(Connected));
        assert!(Connecting.can_transition_to(Disconnected));
        assert!(Connected.can_transition_to(Disconnected));
        assert!(Idle.can_transition_to(Disconnected));
    }

    #[test]
    fn disconnected_is_terminal() {
        for next in [Idle, Connecting, Connected, Disconnected] {
            assert!(!Disconnected.can_transition_to(next));
        }
        assert!(Disconnected.is_terminal());
    }

    #[test]
    fn no_going_back() {
        assert!(!Connected.can_transition_to(Connecting));
        assert!(!Connected.can_transition_to(Idle));
        assert!(!Connecting.can_transition_to(Idle));
    }
}
