//! Shared session state
//!
//! One `Session` value per bot process, created once and passed explicitly
//! to every component that needs it. Holds everything that must survive a
//! reconnect: the session identifier, the resume URL, the last observed
//! sequence number, and the heartbeat record.

use super::heartbeat::HeartbeatRecord;
use crate::events::CurrentUser;
use crate::protocol::ResumePayload;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

/// Session state shared between the run loop, the heartbeat monitor, and
/// event handlers
#[derive(Debug, Default)]
pub struct Session {
    /// Last observed dispatch sequence number
    sequence: AtomicU64,

    /// Whether any sequence number has been observed yet
    has_sequence: AtomicBool,

    /// Identifier assigned by the server on ready
    session_id: RwLock<Option<String>>,

    /// URL to reconnect to when resuming
    resume_url: RwLock<Option<String>>,

    /// The bot's own user, known after the first ready
    user: RwLock<Option<CurrentUser>>,

    /// Heartbeat bookkeeping for the current transport
    heartbeat: Mutex<HeartbeatRecord>,
}

impl Session {
    /// Create an empty session
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // === Sequence ===

    /// Record an observed sequence number
    ///
    /// The stored value never decreases, including during resume replay.
    pub fn observe_sequence(&self, seq: u64) {
        self.sequence.fetch_max(seq, Ordering::SeqCst);
        self.has_sequence.store(true, Ordering::SeqCst);
    }

    /// Last observed sequence number, if any
    #[must_use]
    pub fn last_sequence(&self) -> Option<u64> {
        if self.has_sequence.load(Ordering::SeqCst) {
            Some(self.sequence.load(Ordering::SeqCst))
        } else {
            None
        }
    }

    // === Identity ===

    /// Store the server-assigned session data from a ready event
    pub fn establish(&self, session_id: String, resume_url: Option<String>, user: CurrentUser) {
        *self.session_id.write() = Some(session_id);
        *self.resume_url.write() = resume_url;
        *self.user.write() = Some(user);
    }

    /// Whether a session identifier is held, making a resume possible
    #[must_use]
    pub fn can_resume(&self) -> bool {
        self.session_id.read().is_some()
    }

    /// The held session identifier
    #[must_use]
    pub fn session_id(&self) -> Option<String> {
        self.session_id.read().clone()
    }

    /// URL to use for the next resume attempt, if the server provided one
    #[must_use]
    pub fn resume_url(&self) -> Option<String> {
        self.resume_url.read().clone()
    }

    /// The bot's own user
    #[must_use]
    pub fn user(&self) -> Option<CurrentUser> {
        self.user.read().clone()
    }

    /// Build the resume payload for the held session
    ///
    /// Returns `None` when no session identifier is held.
    #[must_use]
    pub fn resume_payload(&self, token: &str) -> Option<ResumePayload> {
        let session_id = self.session_id()?;
        Some(ResumePayload {
            token: token.to_string(),
            session_id,
            seq: self.last_sequence().unwrap_or(0),
        })
    }

    /// Clear the session identity after a non-resumable invalid session
    ///
    /// A fresh handshake is required afterwards.
    pub fn clear(&self) {
        *self.session_id.write() = None;
        *self.resume_url.write() = None;
        self.has_sequence.store(false, Ordering::SeqCst);
        self.sequence.store(0, Ordering::SeqCst);
    }

    // === Heartbeat record ===

    /// Reset heartbeat bookkeeping; called on every successful handshake
    pub fn reset_heartbeat(&self) {
        *self.heartbeat.lock() = HeartbeatRecord::default();
    }

    /// Record an outbound heartbeat; sets acknowledgement-pending
    pub fn mark_heartbeat_sent(&self) {
        self.heartbeat.lock().mark_sent();
    }

    /// Whether the last heartbeat is still unacknowledged
    #[must_use]
    pub fn heartbeat_pending(&self) -> bool {
        self.heartbeat.lock().is_pending()
    }

    /// Record a heartbeat acknowledgement, returning the measured latency
    pub fn ack_heartbeat(&self) -> Option<Duration> {
        self.heartbeat.lock().mark_acked()
    }

    /// Latency measured on the most recent acknowledgement
    #[must_use]
    pub fn heartbeat_latency(&self) -> Option<Duration> {
        self.heartbeat.lock().latency()
    }
}
