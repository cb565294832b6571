//! Gateway client
//!
//! Owns the connection lifecycle: establish the transport, run the
//! handshake, keep the session alive, and decide between resume and fresh
//! identify whenever the connection drops. All transport writes are
//! serialized through one writer task; the heartbeat monitor and the read
//! loop are producers into that channel.

mod backoff;
mod heartbeat;
mod policy;
mod session;
mod state;

pub use backoff::Backoff;
pub use heartbeat::{HeartbeatMonitor, HeartbeatRecord};
pub use policy::{CloseAction, ReconnectPolicy};
pub use session::Session;
pub use state::{SessionState, StateEvent};

use crate::error::GatewayError;
use crate::events::{EventContext, EventDispatcher, GatewayEventType, ReadyEvent};
use crate::protocol::{
    CloseCode, GatewayFrame, GatewayIntents, HelloPayload, IdentifyPayload, OpCode,
};
use crate::transport::{
    Connector, TransportEvent, TransportSink, TransportStream, WebSocketConnector,
};
use pedantic_common::AppConfig;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Instant};

/// Consecutive decode failures tolerated before forcing a reconnect
const MAX_PROTOCOL_VIOLATIONS: u32 = 3;

/// Buffer size of the single-writer outbound channel
const OUTBOUND_BUFFER_SIZE: usize = 16;

/// Gateway client configuration
#[derive(Clone)]
pub struct GatewayConfig {
    /// Bot token sent in identify and resume frames
    pub token: String,
    /// Event intents requested during identify
    pub intents: GatewayIntents,
    /// Gateway URL obtained once at startup
    pub gateway_url: String,
    /// Bounded wait for establishing the transport
    pub connect_timeout: Duration,
    /// Bounded wait for each handshake phase
    pub handshake_timeout: Duration,
    /// Base reconnect delay
    pub backoff_base: Duration,
    /// Maximum reconnect delay
    pub backoff_max: Duration,
    /// Close-code classification
    pub policy: ReconnectPolicy,
}

impl GatewayConfig {
    /// Create a configuration with default tuning
    #[must_use]
    pub fn new(
        token: impl Into<String>,
        intents: GatewayIntents,
        gateway_url: impl Into<String>,
    ) -> Self {
        Self {
            token: token.into(),
            intents,
            gateway_url: gateway_url.into(),
            connect_timeout: Duration::from_secs(10),
            handshake_timeout: Duration::from_secs(30),
            backoff_base: Duration::from_secs(1),
            backoff_max: Duration::from_secs(60),
            policy: ReconnectPolicy::default(),
        }
    }

    /// Build from the application configuration
    #[must_use]
    pub fn from_app(config: &AppConfig, gateway_url: impl Into<String>) -> Self {
        let mut policy = ReconnectPolicy::default();
        if let Some(codes) = &config.gateway.resumable_close_codes {
            policy = policy.mark_resumable(codes);
        }

        Self {
            token: config.discord.token.clone(),
            intents: GatewayIntents::message_reader(),
            gateway_url: gateway_url.into(),
            connect_timeout: Duration::from_millis(config.gateway.connect_timeout_ms),
            handshake_timeout: Duration::from_millis(config.gateway.handshake_timeout_ms),
            backoff_base: Duration::from_millis(config.gateway.backoff_base_ms),
            backoff_max: Duration::from_millis(config.gateway.backoff_max_ms),
            policy,
        }
    }
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("token", &"<redacted>")
            .field("intents", &self.intents)
            .field("gateway_url", &self.gateway_url)
            .field("connect_timeout", &self.connect_timeout)
            .field("handshake_timeout", &self.handshake_timeout)
            .finish()
    }
}

/// Requests a graceful shutdown of a running [`GatewayClient`]
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    tx: watch::Sender<bool>,
}

impl ShutdownHandle {
    /// Request shutdown; safe to call from any state, including
    /// mid-handshake
    pub fn shutdown(&self) {
        let _ = self.tx.send(true);
    }
}

/// How one connection attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectionExit {
    /// Graceful shutdown was requested
    Shutdown,
    /// Recoverable failure; reconnect after backoff
    Retry,
}

/// The gateway client
pub struct GatewayClient {
    config: GatewayConfig,
    session: Arc<Session>,
    dispatcher: Arc<EventDispatcher>,
    connector: Arc<dyn Connector>,
    shutdown_rx: watch::Receiver<bool>,
    state_tx: watch::Sender<SessionState>,
}

impl GatewayClient {
    /// Create a client using the WebSocket transport
    #[must_use]
    pub fn new(config: GatewayConfig, dispatcher: Arc<EventDispatcher>) -> (Self, ShutdownHandle) {
        Self::with_connector(config, dispatcher, Arc::new(WebSocketConnector))
    }

    /// Create a client over a custom transport connector
    #[must_use]
    pub fn with_connector(
        config: GatewayConfig,
        dispatcher: Arc<EventDispatcher>,
        connector: Arc<dyn Connector>,
    ) -> (Self, ShutdownHandle) {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (state_tx, _) = watch::channel(SessionState::Disconnected);

        let client = Self {
            config,
            session: Arc::new(Session::new()),
            dispatcher,
            connector,
            shutdown_rx,
            state_tx,
        };

        (client, ShutdownHandle { tx: shutdown_tx })
    }

    /// Shared session state
    #[must_use]
    pub fn session(&self) -> Arc<Session> {
        self.session.clone()
    }

    /// Watch the connection lifecycle state
    #[must_use]
    pub fn state(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    /// Run the client until shutdown or a fatal error
    ///
    /// Recoverable failures (transport drops, handshake timeouts, stale
    /// heartbeats, protocol violations) are absorbed by the reconnect
    /// path and never surface here.
    pub async fn run(self) -> Result<(), GatewayError> {
        let mut backoff = Backoff::new(self.config.backoff_base, self.config.backoff_max);
        let mut state = SessionState::Disconnected;
        let mut shutdown = self.shutdown_rx.clone();

        loop {
            if *shutdown.borrow() {
                self.advance(&mut state, StateEvent::CloseRequested);
                self.advance(&mut state, StateEvent::Closed);
                return Ok(());
            }

            match self.run_connection(&mut state, &mut backoff).await? {
                ConnectionExit::Shutdown => {
                    self.advance(&mut state, StateEvent::Closed);
                    tracing::info!("Gateway client shut down");
                    return Ok(());
                }
                ConnectionExit::Retry => {
                    let delay = backoff.next_delay();
                    tracing::info!(
                        attempt = backoff.attempt(),
                        delay_ms = delay.as_millis() as u64,
                        resuming = state == SessionState::Resuming,
                        "Reconnecting after delay"
                    );

                    tokio::select! {
                        () = sleep(delay) => {}
                        () = wait_shutdown(&mut shutdown) => {
                            self.advance(&mut state, StateEvent::CloseRequested);
                            self.advance(&mut state, StateEvent::Closed);
                            return Ok(());
                        }
                    }
                }
            }
        }
    }

    /// Apply a state event and publish the change
    fn advance(&self, state: &mut SessionState, event: StateEvent) {
        let next = state.apply(event);
        if next != *state {
            tracing::debug!(from = %state, to = %next, "Session state changed");
            *state = next;
            let _ = self.state_tx.send(next);
        }
    }

    /// Run one connection from establishment to its end
    async fn run_connection(
        &self,
        state: &mut SessionState,
        backoff: &mut Backoff,
    ) -> Result<ConnectionExit, GatewayError> {
        let resuming = *state == SessionState::Resuming && self.session.can_resume();
        if *state == SessionState::Resuming && !resuming {
            // Resume intended but no session held; fall back to fresh
            self.advance(state, StateEvent::Interrupted { resumable: false });
        }
        self.advance(state, StateEvent::ConnectRequested);

        let url = if resuming {
            self.session
                .resume_url()
                .unwrap_or_else(|| self.config.gateway_url.clone())
        } else {
            self.config.gateway_url.clone()
        };

        tracing::info!(%url, resuming, "Connecting to gateway");

        let transport = match timeout(self.config.connect_timeout, self.connector.connect(&url)).await
        {
            Ok(Ok(transport)) => transport,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Failed to establish transport");
                self.advance(state, StateEvent::Interrupted { resumable: resuming });
                return Ok(ConnectionExit::Retry);
            }
            Err(_) => {
                tracing::warn!("Timed out establishing transport");
                self.advance(state, StateEvent::Interrupted { resumable: resuming });
                return Ok(ConnectionExit::Retry);
            }
        };

        self.advance(state, StateEvent::TransportEstablished);

        let (sink, stream) = transport.split();
        let (out_tx, out_rx) = mpsc::channel(OUTBOUND_BUFFER_SIZE);
        let writer = tokio::spawn(write_loop(sink, out_rx));

        let exit = self.drive(state, backoff, stream, &out_tx, resuming).await;

        // Fully retire this transport before the next attempt: the
        // heartbeat task is already stopped; closing the outbound channel
        // makes the writer close the socket.
        drop(out_tx);
        let _ = writer.await;

        exit
    }

    /// Drive an established transport: hello, identify/resume, event flow
    async fn drive(
        &self,
        state: &mut SessionState,
        backoff: &mut Backoff,
        mut stream: Box<dyn TransportStream>,
        out_tx: &mpsc::Sender<GatewayFrame>,
        resuming: bool,
    ) -> Result<ConnectionExit, GatewayError> {
        let mut shutdown = self.shutdown_rx.clone();
        let mut violations: u32 = 0;

        // Hello phase, bounded
        let hello: HelloPayload = tokio::select! {
            () = wait_shutdown(&mut shutdown) => {
                self.advance(state, StateEvent::CloseRequested);
                return Ok(ConnectionExit::Shutdown);
            }
            outcome = timeout(
                self.config.handshake_timeout,
                await_hello(stream.as_mut(), &mut violations),
            ) => match outcome {
                Err(_) => {
                    tracing::warn!("Timed out waiting for hello");
                    self.advance(state, StateEvent::Interrupted { resumable: resuming });
                    return Ok(ConnectionExit::Retry);
                }
                Ok(HelloWait::Hello(payload)) => payload,
                Ok(HelloWait::Closed(code)) => return self.handle_close(state, code),
                Ok(HelloWait::Escalated) => {
                    tracing::warn!("Repeated protocol violations before hello, reconnecting");
                    self.advance(
                        state,
                        StateEvent::Interrupted { resumable: self.session.can_resume() },
                    );
                    return Ok(ConnectionExit::Retry);
                }
            }
        };

        self.advance(state, StateEvent::HelloReceived);
        tracing::info!(heartbeat_interval_ms = hello.heartbeat_interval, "Hello received");

        // Arm the heartbeat monitor against this transport
        self.session.reset_heartbeat();
        let (stale_tx, mut stale_rx) = mpsc::channel(1);
        let _monitor = AbortOnDrop(HeartbeatMonitor::spawn(
            Duration::from_millis(hello.heartbeat_interval),
            self.session.clone(),
            out_tx.clone(),
            stale_tx,
        ));

        // Identify a fresh session or resume the held one
        let handshake_frame = if resuming {
            // can_resume was checked when the attempt started
            match self.session.resume_payload(&self.config.token) {
                Some(payload) => {
                    tracing::info!(
                        session_id = %payload.session_id,
                        seq = payload.seq,
                        "Resuming session"
                    );
                    GatewayFrame::resume(&payload)
                }
                None => {
                    GatewayFrame::identify(&IdentifyPayload::new(
                        &self.config.token,
                        self.config.intents,
                    ))
                }
            }
        } else {
            tracing::info!("Identifying");
            GatewayFrame::identify(&IdentifyPayload::new(&self.config.token, self.config.intents))
        };

        if out_tx.send(handshake_frame).await.is_err() {
            tracing::warn!("Writer ended before the handshake");
            self.advance(state, StateEvent::Interrupted { resumable: self.session.can_resume() });
            return Ok(ConnectionExit::Retry);
        }

        // The handshake must finish within the bounded wait; once Ready,
        // the deadline branch disarms.
        let mut deadline = Instant::now() + self.config.handshake_timeout;
        let mut stable = false;

        loop {
            tokio::select! {
                () = wait_shutdown(&mut shutdown) => {
                    self.advance(state, StateEvent::CloseRequested);
                    return Ok(ConnectionExit::Shutdown);
                }

                stale = stale_rx.recv() => {
                    if stale.is_some() {
                        tracing::warn!("Heartbeat stale, forcing reconnect");
                    } else {
                        tracing::debug!("Heartbeat monitor ended unexpectedly");
                    }
                    self.advance(
                        state,
                        StateEvent::Interrupted { resumable: self.session.can_resume() },
                    );
                    return Ok(ConnectionExit::Retry);
                }

                () = tokio::time::sleep_until(deadline), if !state.is_ready() => {
                    tracing::warn!(state = %state, "Handshake did not complete in time");
                    self.advance(
                        state,
                        StateEvent::Interrupted { resumable: self.session.can_resume() },
                    );
                    return Ok(ConnectionExit::Retry);
                }

                event = stream.next() => match event {
                    Some(Ok(TransportEvent::Text(text))) => match GatewayFrame::from_json(&text) {
                        Ok(frame) => {
                            violations = 0;
                            if let Some(exit) = self
                                .handle_frame(state, backoff, out_tx, &mut deadline, &mut stable, frame)
                                .await?
                            {
                                return Ok(exit);
                            }
                        }
                        Err(e) => {
                            violations += 1;
                            tracing::warn!(error = %e, violations, "Dropping malformed frame");
                            if violations >= MAX_PROTOCOL_VIOLATIONS {
                                tracing::warn!("Repeated protocol violations, forcing reconnect");
                                self.advance(
                                    state,
                                    StateEvent::Interrupted {
                                        resumable: self.session.can_resume(),
                                    },
                                );
                                return Ok(ConnectionExit::Retry);
                            }
                        }
                    },
                    Some(Ok(TransportEvent::Closed(code))) => {
                        return self.handle_close(state, code);
                    }
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "Transport error");
                        self.advance(
                            state,
                            StateEvent::Interrupted { resumable: self.session.can_resume() },
                        );
                        return Ok(ConnectionExit::Retry);
                    }
                    None => {
                        tracing::warn!("Transport stream ended");
                        self.advance(
                            state,
                            StateEvent::Interrupted { resumable: self.session.can_resume() },
                        );
                        return Ok(ConnectionExit::Retry);
                    }
                },
            }
        }
    }

    /// Handle one decoded inbound frame
    ///
    /// Returns `Some(exit)` when the frame ends this connection.
    async fn handle_frame(
        &self,
        state: &mut SessionState,
        backoff: &mut Backoff,
        out_tx: &mpsc::Sender<GatewayFrame>,
        deadline: &mut Instant,
        stable: &mut bool,
        frame: GatewayFrame,
    ) -> Result<Option<ConnectionExit>, GatewayError> {
        match frame.op {
            OpCode::Dispatch => {
                if let Some(seq) = frame.s {
                    self.session.observe_sequence(seq);
                }

                let event_name = frame.t.clone().unwrap_or_default();
                match GatewayEventType::from_str(&event_name) {
                    Some(GatewayEventType::Ready) => {
                        let ready = frame
                            .d
                            .as_ref()
                            .and_then(|d| serde_json::from_value::<ReadyEvent>(d.clone()).ok());
                        match ready {
                            Some(ready) => {
                                tracing::info!(
                                    username = %ready.user.username,
                                    session_id = %ready.session_id,
                                    "Session ready"
                                );
                                self.session.establish(
                                    ready.session_id,
                                    ready.resume_gateway_url,
                                    ready.user,
                                );
                            }
                            None => tracing::warn!("Ready payload could not be decoded"),
                        }
                        self.advance(state, StateEvent::HandshakeCompleted);
                    }
                    Some(GatewayEventType::Resumed) => {
                        tracing::info!(
                            seq = self.session.last_sequence(),
                            "Session resumed, replay complete"
                        );
                        self.advance(state, StateEvent::ResumeCompleted);
                    }
                    _ => {
                        // The first dispatch doubles as the identify ack
                        if *state == SessionState::Identifying {
                            self.advance(state, StateEvent::HandshakeCompleted);
                        }
                    }
                }

                self.dispatch_event(event_name, frame.d.unwrap_or(Value::Null));
            }

            OpCode::HeartbeatAck => {
                let latency = self.session.ack_heartbeat();
                tracing::trace!(
                    latency_ms = latency.map(|l| l.as_millis() as u64),
                    "Heartbeat acknowledged"
                );
                if !*stable && state.is_ready() {
                    // Handshake done and a heartbeat acknowledged: the
                    // connection counts as stably running
                    *stable = true;
                    backoff.record_success();
                }
            }

            OpCode::Heartbeat => {
                tracing::debug!("Immediate heartbeat requested by server");
                self.session.mark_heartbeat_sent();
                let beat = GatewayFrame::heartbeat(self.session.last_sequence());
                if out_tx.send(beat).await.is_err() {
                    self.advance(
                        state,
                        StateEvent::Interrupted { resumable: self.session.can_resume() },
                    );
                    return Ok(Some(ConnectionExit::Retry));
                }
            }

            OpCode::Reconnect => {
                tracing::info!("Server requested reconnect");
                self.advance(
                    state,
                    StateEvent::Interrupted { resumable: self.session.can_resume() },
                );
                return Ok(Some(ConnectionExit::Retry));
            }

            OpCode::InvalidSession => {
                let resumable = frame.as_invalid_session().unwrap_or(false);
                tracing::warn!(resumable, state = %state, "Session invalidated by server");

                if resumable {
                    // Try the resume again over a fresh transport
                    self.advance(
                        state,
                        StateEvent::Interrupted { resumable: self.session.can_resume() },
                    );
                    return Ok(Some(ConnectionExit::Retry));
                }

                self.session.clear();

                if *state == SessionState::Resuming {
                    // The connection itself is fine; fall back to a fresh
                    // handshake on it. The next outbound frame must be an
                    // identify.
                    self.advance(state, StateEvent::InvalidSession { resumable: false });
                    *deadline = Instant::now() + self.config.handshake_timeout;

                    let identify = GatewayFrame::identify(&IdentifyPayload::new(
                        &self.config.token,
                        self.config.intents,
                    ));
                    if out_tx.send(identify).await.is_err() {
                        self.advance(state, StateEvent::Interrupted { resumable: false });
                        return Ok(Some(ConnectionExit::Retry));
                    }
                } else {
                    self.advance(state, StateEvent::Interrupted { resumable: false });
                    return Ok(Some(ConnectionExit::Retry));
                }
            }

            OpCode::Hello | OpCode::Identify | OpCode::Resume => {
                tracing::debug!(op = %frame.op, "Ignoring unexpected frame");
            }
        }

        Ok(None)
    }

    /// Classify a transport close and decide the next step
    fn handle_close(
        &self,
        state: &mut SessionState,
        code: Option<u16>,
    ) -> Result<ConnectionExit, GatewayError> {
        let known = code.and_then(CloseCode::from_u16);

        match self.config.policy.classify(code) {
            CloseAction::Fatal => {
                let reason = known.map_or_else(
                    || format!("close code {}", code.unwrap_or_default()),
                    |c| c.to_string(),
                );
                tracing::error!(%reason, "Connection closed with fatal code");
                self.advance(state, StateEvent::Interrupted { resumable: false });

                if known == Some(CloseCode::AuthenticationFailed) {
                    Err(GatewayError::AuthenticationFailed(reason))
                } else {
                    Err(GatewayError::FatalClose {
                        code: code.unwrap_or_default(),
                        reason,
                    })
                }
            }
            CloseAction::Reidentify => {
                tracing::warn!(?code, "Connection closed, session no longer valid");
                self.session.clear();
                self.advance(state, StateEvent::Interrupted { resumable: false });
                Ok(ConnectionExit::Retry)
            }
            CloseAction::Resume => {
                tracing::warn!(?code, "Connection closed, will reconnect");
                self.advance(
                    state,
                    StateEvent::Interrupted { resumable: self.session.can_resume() },
                );
                Ok(ConnectionExit::Retry)
            }
        }
    }

    /// Route a dispatch frame to the handler registry
    ///
    /// Offloaded to its own task so a slow handler never blocks the read
    /// loop; ordering holds within one dispatch, not across dispatches.
    fn dispatch_event(&self, event: String, data: Value) {
        let ctx = EventContext {
            event,
            data,
            user: self.session.user(),
        };
        let dispatcher = self.dispatcher.clone();

        tokio::spawn(async move {
            dispatcher.dispatch(ctx).await;
        });
    }
}

/// Outcome of the hello phase
enum HelloWait {
    Hello(HelloPayload),
    Closed(Option<u16>),
    Escalated,
}

/// Wait for the server's hello on a fresh transport
async fn await_hello(stream: &mut dyn TransportStream, violations: &mut u32) -> HelloWait {
    loop {
        match stream.next().await {
            Some(Ok(TransportEvent::Text(text))) => match GatewayFrame::from_json(&text) {
                Ok(frame) if frame.op == OpCode::Hello => match frame.as_hello() {
                    Some(hello) => return HelloWait::Hello(hello),
                    None => {
                        *violations += 1;
                        tracing::warn!("Hello frame carried no heartbeat interval");
                    }
                },
                Ok(frame) => {
                    tracing::trace!(op = %frame.op, "Ignoring frame before hello");
                }
                Err(e) => {
                    *violations += 1;
                    tracing::warn!(error = %e, "Dropping malformed frame before hello");
                }
            },
            Some(Ok(TransportEvent::Closed(code))) => return HelloWait::Closed(code),
            Some(Err(e)) => {
                tracing::warn!(error = %e, "Transport error before hello");
                return HelloWait::Closed(None);
            }
            None => return HelloWait::Closed(None),
        }

        if *violations >= MAX_PROTOCOL_VIOLATIONS {
            return HelloWait::Escalated;
        }
    }
}

/// Single writer for one transport
///
/// Every outbound frame, from the read loop and the heartbeat monitor
/// alike, passes through this task; frames are never interleaved. When
/// the channel closes the socket is closed with it.
async fn write_loop(mut sink: Box<dyn TransportSink>, mut rx: mpsc::Receiver<GatewayFrame>) {
    while let Some(frame) = rx.recv().await {
        match frame.to_json() {
            Ok(text) => {
                tracing::trace!(op = %frame.op, "Sending frame");
                if let Err(e) = sink.send(text).await {
                    tracing::warn!(error = %e, "Failed to send frame");
                    break;
                }
            }
            Err(e) => tracing::warn!(error = %e, "Failed to encode frame"),
        }
    }

    let _ = sink.close().await;
}

/// Resolve when shutdown is requested; never resolves if the handle was
/// dropped without requesting it
async fn wait_shutdown(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow() {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Aborts the wrapped task when dropped
struct AbortOnDrop(JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}
