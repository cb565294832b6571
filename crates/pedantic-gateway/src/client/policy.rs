//! Reconnect policy
//!
//! Classifies connection drops by close code. The tables are data, not
//! hardcoded behavior: configuration can mark additional codes resumable.

use crate::protocol::CloseCode;
use std::collections::BTreeSet;

/// What to do after the transport closed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseAction {
    /// Reattach to the held session
    Resume,
    /// Discard the session and run a fresh handshake
    Reidentify,
    /// Stop; retrying cannot succeed
    Fatal,
}

/// Close-code classification tables
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    fatal: BTreeSet<u16>,
    reidentify: BTreeSet<u16>,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            fatal: BTreeSet::from([
                CloseCode::AuthenticationFailed.as_u16(),
                CloseCode::InvalidIntents.as_u16(),
                CloseCode::DisallowedIntents.as_u16(),
            ]),
            reidentify: BTreeSet::from([
                CloseCode::InvalidSequence.as_u16(),
                CloseCode::SessionTimeout.as_u16(),
            ]),
        }
    }
}

impl ReconnectPolicy {
    /// Classify a close; `None` means the transport dropped without a
    /// close code (connection reset, stream end), which is resumable.
    #[must_use]
    pub fn classify(&self, close_code: Option<u16>) -> CloseAction {
        match close_code {
            Some(code) if self.fatal.contains(&code) => CloseAction::Fatal,
            Some(code) if self.reidentify.contains(&code) => CloseAction::Reidentify,
            _ => CloseAction::Resume,
        }
    }

    /// Force the given codes to be treated as resumable
    ///
    /// Used to apply a configuration-supplied override list.
    #[must_use]
    pub fn mark_resumable(mut self, codes: &[u16]) -> Self {
        for code in codes {
            self.fatal.remove(code);
            self.reidentify.remove(code);
        }
        self
    }

    /// Codes currently classified as fatal
    #[must_use]
    pub fn fatal_codes(&self) -> impl Iterator<Item = u16> + '_ {
        self.fatal.iter().copied()
    }
}
