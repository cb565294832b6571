//! Session lifecycle state machine
//!
//! Pure transition table: current state + event → next state. The async
//! run loop translates transport and frame happenings into [`StateEvent`]s
//! and applies them here, which keeps the lifecycle testable without
//! timers or sockets.

use serde::{Deserialize, Serialize};

/// Connection lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// No transport; waiting to connect
    Disconnected,
    /// Establishing the transport
    Connecting,
    /// Transport up; waiting for the server's hello
    AwaitingHello,
    /// Identify sent; waiting for the ready ack
    Identifying,
    /// Session established; events flowing
    Ready,
    /// Reattaching to a held session across a reconnect
    Resuming,
    /// Graceful shutdown in progress
    Closing,
}

/// Lifecycle happenings the run loop feeds into the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateEvent {
    /// Start (or restart after backoff) was requested
    ConnectRequested,
    /// The transport is established
    TransportEstablished,
    /// The server's hello arrived
    HelloReceived,
    /// Identify was acknowledged (ready dispatch, or first dispatch)
    HandshakeCompleted,
    /// The server confirmed the resume (replay finished)
    ResumeCompleted,
    /// The server declared the session invalid
    InvalidSession { resumable: bool },
    /// The connection was cut short: transport loss, handshake timeout,
    /// heartbeat staleness, protocol-violation escalation, or a
    /// server-requested reconnect. `resumable` says whether a held
    /// session survives the cut.
    Interrupted { resumable: bool },
    /// Graceful shutdown was requested
    CloseRequested,
    /// The transport is fully retired
    Closed,
}

impl SessionState {
    /// Apply one event, returning the next state
    ///
    /// Combinations not listed keep the current state; in particular a
    /// hello received while `Resuming` stays in `Resuming` (the run loop
    /// answers it with a resume frame instead of an identify).
    #[must_use]
    pub fn apply(self, event: StateEvent) -> Self {
        use SessionState as S;
        use StateEvent as E;

        match (self, event) {
            // Shutdown wins from every state, including mid-handshake
            (_, E::CloseRequested) => S::Closing,
            (S::Closing, E::Closed) => S::Disconnected,
            (S::Closing, _) => S::Closing,

            (S::Disconnected, E::ConnectRequested) => S::Connecting,
            (S::Connecting, E::TransportEstablished) => S::AwaitingHello,
            (S::AwaitingHello, E::HelloReceived) => S::Identifying,
            (S::Identifying | S::Resuming, E::HandshakeCompleted) => S::Ready,
            (S::Resuming, E::ResumeCompleted) => S::Ready,

            // A rejected resume falls back to a fresh handshake on the
            // live connection; the session must already be cleared.
            (S::Resuming, E::InvalidSession { resumable: false }) => S::Identifying,
            (S::Resuming, E::InvalidSession { resumable: true }) => S::Resuming,

            (_, E::Interrupted { resumable: true }) => S::Resuming,
            (_, E::Interrupted { resumable: false }) => S::Disconnected,

            // Reconnecting while resuming re-runs the transport phases
            // without leaving `Resuming`.
            (S::Resuming, E::ConnectRequested | E::TransportEstablished | E::HelloReceived) => {
                S::Resuming
            }

            (state, _) => state,
        }
    }

    /// Whether the handshake has completed on the current transport
    #[must_use]
    pub const fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Get the name of this state
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Disconnected => "Disconnected",
            Self::Connecting => "Connecting",
            Self::AwaitingHello => "AwaitingHello",
            Self::Identifying => "Identifying",
            Self::Ready => "Ready",
            Self::Resuming => "Resuming",
            Self::Closing => "Closing",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use SessionState as S;
    use StateEvent as E;

    /// Run a sequence of events from `Disconnected`
    fn drive(events: &[E]) -> S {
        events.iter().fold(S::Disconnected, |s, e| s.apply(*e))
    }

    #[test]
    fn test_fresh_handshake_path() {
        assert_eq!(drive(&[E::ConnectRequested]), S::Connecting);
        assert_eq!(drive(&[E::ConnectRequested, E::TransportEstablished]), S::AwaitingHello);
        assert_eq!(
            drive(&[E::ConnectRequested, E::TransportEstablished, E::HelloReceived]),
            S::Identifying
        );
        assert_eq!(
            drive(&[
                E::ConnectRequested,
                E::TransportEstablished,
                E::HelloReceived,
                E::HandshakeCompleted,
            ]),
            S::Ready
        );
    }

    #[test]
    fn test_hello_never_skips_awaiting_hello() {
        // A hello arriving while still Connecting must not jump ahead
        assert_eq!(drive(&[E::ConnectRequested, E::HelloReceived]), S::Connecting);
        // Nor can the handshake complete before hello
        assert_eq!(
            drive(&[E::ConnectRequested, E::TransportEstablished, E::HandshakeCompleted]),
            S::AwaitingHello
        );
    }

    #[test]
    fn test_recoverable_interruption_enters_resuming() {
        assert_eq!(S::Ready.apply(E::Interrupted { resumable: true }), S::Resuming);
        assert_eq!(S::Identifying.apply(E::Interrupted { resumable: true }), S::Resuming);
        assert_eq!(S::Resuming.apply(E::Interrupted { resumable: true }), S::Resuming);
    }

    #[test]
    fn test_reconnect_request_never_goes_straight_to_disconnected() {
        // A server reconnect request with a held session is always resumable
        let next = S::Ready.apply(E::Interrupted { resumable: true });
        assert_eq!(next, S::Resuming);
        assert_ne!(next, S::Disconnected);
    }

    #[test]
    fn test_unrecoverable_interruption_disconnects() {
        assert_eq!(S::Ready.apply(E::Interrupted { resumable: false }), S::Disconnected);
        assert_eq!(S::AwaitingHello.apply(E::Interrupted { resumable: false }), S::Disconnected);
        assert_eq!(S::Connecting.apply(E::Interrupted { resumable: false }), S::Disconnected);
    }

    #[test]
    fn test_resume_reconnect_keeps_resuming_through_transport_phases() {
        let mut state = S::Ready.apply(E::Interrupted { resumable: true });
        for event in [E::ConnectRequested, E::TransportEstablished, E::HelloReceived] {
            state = state.apply(event);
            assert_eq!(state, S::Resuming);
        }
        assert_eq!(state.apply(E::ResumeCompleted), S::Ready);
    }

    #[test]
    fn test_rejected_resume_requires_fresh_identify() {
        assert_eq!(
            S::Resuming.apply(E::InvalidSession { resumable: false }),
            S::Identifying
        );
        assert_eq!(
            S::Resuming.apply(E::InvalidSession { resumable: true }),
            S::Resuming
        );
    }

    #[test]
    fn test_shutdown_from_every_state() {
        for state in [
            S::Disconnected,
            S::Connecting,
            S::AwaitingHello,
            S::Identifying,
            S::Ready,
            S::Resuming,
        ] {
            assert_eq!(state.apply(E::CloseRequested), S::Closing);
        }
        assert_eq!(S::Closing.apply(E::Closed), S::Disconnected);
    }

    #[test]
    fn test_closing_ignores_other_events() {
        assert_eq!(S::Closing.apply(E::HelloReceived), S::Closing);
        assert_eq!(S::Closing.apply(E::Interrupted { resumable: true }), S::Closing);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(format!("{}", S::AwaitingHello), "AwaitingHello");
        assert_eq!(format!("{}", S::Resuming), "Resuming");
    }
}
