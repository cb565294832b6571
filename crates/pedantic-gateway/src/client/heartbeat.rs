//! Heartbeat monitor
//!
//! Sends heartbeats on the server-supplied interval through the shared
//! single-writer channel and tracks acknowledgements. The first beat is
//! delayed by a random jitter within the interval so a fleet of clients
//! reconnecting at once does not beat in lockstep.

use super::Session;
use crate::protocol::GatewayFrame;
use rand::Rng;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Heartbeat bookkeeping for one transport
///
/// Pure state: sent/acked flags and latency, no timers. The monitor task
/// and the run loop drive it through [`Session`].
#[derive(Debug, Default)]
pub struct HeartbeatRecord {
    last_sent: Option<Instant>,
    pending: bool,
    latency: Option<Duration>,
}

impl HeartbeatRecord {
    /// Record an outbound heartbeat
    pub fn mark_sent(&mut self) {
        self.last_sent = Some(Instant::now());
        self.pending = true;
    }

    /// Record an acknowledgement, returning the measured latency
    pub fn mark_acked(&mut self) -> Option<Duration> {
        self.pending = false;
        let latency = self.last_sent.map(|sent| sent.elapsed());
        if latency.is_some() {
            self.latency = latency;
        }
        latency
    }

    /// Whether a sent heartbeat is still unacknowledged
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Latency measured on the most recent acknowledgement
    #[must_use]
    pub fn latency(&self) -> Option<Duration> {
        self.latency
    }
}

/// Periodic heartbeat task for one transport
pub struct HeartbeatMonitor;

impl HeartbeatMonitor {
    /// Spawn the monitor
    ///
    /// Beats every `interval`, starting after a random jitter within the
    /// interval. If an interval elapses with the previous beat still
    /// unacknowledged, the connection is stale: a signal is sent on
    /// `stale_tx` and the task ends. The task also ends when the outbound
    /// channel closes (transport retired).
    pub fn spawn(
        interval: Duration,
        session: Arc<Session>,
        outbound: mpsc::Sender<GatewayFrame>,
        stale_tx: mpsc::Sender<()>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let jitter = initial_jitter(interval);
            tracing::debug!(
                interval_ms = interval.as_millis() as u64,
                jitter_ms = jitter.as_millis() as u64,
                "Heartbeat monitor armed"
            );
            tokio::time::sleep(jitter).await;

            loop {
                if session.heartbeat_pending() {
                    tracing::warn!("Heartbeat not acknowledged within one interval, connection is stale");
                    let _ = stale_tx.send(()).await;
                    return;
                }

                let frame = GatewayFrame::heartbeat(session.last_sequence());
                session.mark_heartbeat_sent();
                if outbound.send(frame).await.is_err() {
                    tracing::debug!("Outbound channel closed, heartbeat monitor stopping");
                    return;
                }

                tokio::time::sleep(interval).await;
            }
        })
    }
}

/// Uniform random delay in `[0, interval)` for the first beat
fn initial_jitter(interval: Duration) -> Duration {
    let interval_ms = interval.as_millis() as u64;
    if interval_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::thread_rng().gen_range(0..interval_ms))
}
