//! End-to-end tests of the gateway client against a scripted transport
//!
//! Time is paused: sleeps and timers auto-advance, so jitter windows and
//! backoff delays run instantly and deterministically.

use integration_tests::mock::MockConnector;
use pedantic_gateway::events::EventDispatcher;
use pedantic_gateway::protocol::GatewayIntents;
use pedantic_gateway::{GatewayClient, GatewayConfig, GatewayError, SessionState};
use std::time::Duration;

fn config() -> GatewayConfig {
    GatewayConfig::new(
        "test-token",
        GatewayIntents::message_reader(),
        "wss://gateway.test",
    )
}

/// Poll until a condition holds; panics if it never does
async fn until(what: &str, cond: impl Fn() -> bool) {
    for _ in 0..1_000 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached: {what}");
}

#[tokio::test(start_paused = true)]
async fn handshake_reaches_ready() {
    let (connector, mut servers) = MockConnector::script(1);
    let mut server = servers.remove(0);

    let (client, shutdown) =
        GatewayClient::with_connector(config(), EventDispatcher::new_shared(), connector);
    let mut state = client.state();
    let session = client.session();
    let task = tokio::spawn(client.run());

    server.send_hello(45_000);

    // Identify follows the hello, carrying token and intents
    let identify = server.recv_non_heartbeat().await;
    assert_eq!(identify["op"], 2);
    assert_eq!(identify["d"]["token"], "test-token");
    assert_eq!(
        identify["d"]["intents"],
        GatewayIntents::message_reader().bits()
    );

    server.send_ready(1, "sess-1", Some("wss://resume.test"));

    state
        .wait_for(|s| *s == SessionState::Ready)
        .await
        .unwrap();
    assert_eq!(session.session_id().as_deref(), Some("sess-1"));
    assert_eq!(session.resume_url().as_deref(), Some("wss://resume.test"));
    assert_eq!(session.last_sequence(), Some(1));

    shutdown.shutdown();
    task.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn sequence_never_decreases() {
    let (connector, mut servers) = MockConnector::script(1);
    let mut server = servers.remove(0);

    let (client, shutdown) =
        GatewayClient::with_connector(config(), EventDispatcher::new_shared(), connector);
    let session = client.session();
    let task = tokio::spawn(client.run());

    server.send_hello(45_000);
    server.recv_non_heartbeat().await;
    server.send_ready(1, "sess-1", None);

    // Out-of-order sequence numbers must never lower the stored value
    server.send_dispatch("TYPING_START", 5, "{}");
    server.send_dispatch("TYPING_START", 3, "{}");
    server.send_dispatch("TYPING_START", 7, "{}");

    let observed = session.clone();
    until("sequence reached 7", move || {
        observed.last_sequence() == Some(7)
    })
    .await;
    assert_eq!(session.last_sequence(), Some(7));

    shutdown.shutdown();
    task.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn reconnect_request_resumes_on_the_resume_url() {
    let (connector, mut servers) = MockConnector::script(2);
    let mut second = servers.pop().unwrap();
    let mut first = servers.pop().unwrap();

    let (client, shutdown) =
        GatewayClient::with_connector(config(), EventDispatcher::new_shared(), connector.clone());
    let mut state = client.state();
    let session = client.session();
    let task = tokio::spawn(client.run());

    first.send_hello(45_000);
    first.recv_non_heartbeat().await;
    first.send_ready(3, "sess-1", Some("wss://resume.test"));
    state
        .wait_for(|s| *s == SessionState::Ready)
        .await
        .unwrap();

    // The server asks for a reconnect: out of Ready into Resuming,
    // never straight to Disconnected
    first.request_reconnect();
    state
        .wait_for(|s| *s == SessionState::Resuming)
        .await
        .unwrap();

    // The new transport handshakes with a resume, not an identify
    second.send_hello(45_000);
    let resume = second.recv_non_heartbeat().await;
    assert_eq!(resume["op"], 6);
    assert_eq!(resume["d"]["session_id"], "sess-1");
    assert_eq!(resume["d"]["seq"], 3);

    // Replayed events flow through and bump the sequence
    second.send_dispatch("TYPING_START", 4, "{}");
    second.send_resumed(5);
    state
        .wait_for(|s| *s == SessionState::Ready)
        .await
        .unwrap();
    assert_eq!(session.last_sequence(), Some(5));

    assert_eq!(
        connector.urls(),
        vec!["wss://gateway.test".to_string(), "wss://resume.test".to_string()]
    );

    shutdown.shutdown();
    task.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn rejected_resume_falls_back_to_identify() {
    let (connector, mut servers) = MockConnector::script(2);
    let mut second = servers.pop().unwrap();
    let mut first = servers.pop().unwrap();

    let (client, shutdown) =
        GatewayClient::with_connector(config(), EventDispatcher::new_shared(), connector);
    let mut state = client.state();
    let session = client.session();
    let task = tokio::spawn(client.run());

    first.send_hello(45_000);
    first.recv_non_heartbeat().await;
    first.send_ready(3, "sess-1", None);
    state
        .wait_for(|s| *s == SessionState::Ready)
        .await
        .unwrap();

    first.request_reconnect();

    second.send_hello(45_000);
    let resume = second.recv_non_heartbeat().await;
    assert_eq!(resume["op"], 6);

    // Resume rejected without resumability: the session is cleared and
    // the next outbound frame must be an identify, not a resume
    second.send_invalid_session(false);
    let identify = second.recv_non_heartbeat().await;
    assert_eq!(identify["op"], 2);

    second.send_ready(10, "sess-2", None);
    state
        .wait_for(|s| *s == SessionState::Ready)
        .await
        .unwrap();
    assert_eq!(session.session_id().as_deref(), Some("sess-2"));

    shutdown.shutdown();
    task.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn repeated_malformed_frames_force_reconnect_keeping_the_session() {
    let (connector, mut servers) = MockConnector::script(2);
    let mut second = servers.pop().unwrap();
    let mut first = servers.pop().unwrap();

    let (client, shutdown) =
        GatewayClient::with_connector(config(), EventDispatcher::new_shared(), connector);
    let mut state = client.state();
    let task = tokio::spawn(client.run());

    first.send_hello(45_000);
    first.recv_non_heartbeat().await;
    first.send_ready(8, "sess-1", None);
    state
        .wait_for(|s| *s == SessionState::Ready)
        .await
        .unwrap();

    // Three consecutive protocol violations escalate to a reconnect
    first.send_text("not json");
    first.send_text("also {{ not json");
    first.send_text("still broken");

    // The session survived: the new transport resumes
    second.send_hello(45_000);
    let resume = second.recv_non_heartbeat().await;
    assert_eq!(resume["op"], 6);
    assert_eq!(resume["d"]["session_id"], "sess-1");
    assert_eq!(resume["d"]["seq"], 8);

    shutdown.shutdown();
    task.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn first_heartbeat_lands_inside_the_jitter_window() {
    let start = tokio::time::Instant::now();
    let (connector, mut servers) = MockConnector::script(1);
    let mut server = servers.remove(0);

    let (client, shutdown) =
        GatewayClient::with_connector(config(), EventDispatcher::new_shared(), connector);
    let task = tokio::spawn(client.run());

    server.send_hello(40_000);
    server.recv_non_heartbeat().await;
    server.send_ready(1, "sess-1", None);

    // First beat arrives at some jitter within [0, interval), not on a
    // fixed schedule
    server.recv_heartbeat().await;
    assert!(start.elapsed() < Duration::from_millis(40_000));
    server.ack_heartbeat();

    shutdown.shutdown();
    task.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn stale_heartbeat_forces_a_resume() {
    let (connector, mut servers) = MockConnector::script(2);
    let mut second = servers.pop().unwrap();
    let mut first = servers.pop().unwrap();

    let (client, shutdown) =
        GatewayClient::with_connector(config(), EventDispatcher::new_shared(), connector);
    let mut state = client.state();
    let task = tokio::spawn(client.run());

    first.send_hello(1_000);
    first.recv_non_heartbeat().await;
    first.send_ready(1, "sess-1", None);
    state
        .wait_for(|s| *s == SessionState::Ready)
        .await
        .unwrap();

    // Beats are never acknowledged; one interval later the connection is
    // stale and the client takes the resume path
    first.recv_heartbeat().await;
    state
        .wait_for(|s| *s == SessionState::Resuming)
        .await
        .unwrap();

    second.send_hello(1_000);
    let resume = second.recv_non_heartbeat().await;
    assert_eq!(resume["op"], 6);
    assert_eq!(resume["d"]["session_id"], "sess-1");

    shutdown.shutdown();
    task.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn drop_before_ready_runs_a_fresh_handshake() {
    let (connector, mut servers) = MockConnector::script(2);
    let mut second = servers.pop().unwrap();
    let mut first = servers.pop().unwrap();

    let (client, shutdown) =
        GatewayClient::with_connector(config(), EventDispatcher::new_shared(), connector);
    let task = tokio::spawn(client.run());

    first.send_hello(45_000);
    first.recv_non_heartbeat().await;
    // No session yet; the drop cannot be resumed
    first.close(None);

    second.send_hello(45_000);
    let identify = second.recv_non_heartbeat().await;
    assert_eq!(identify["op"], 2);

    shutdown.shutdown();
    task.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn authentication_failure_is_fatal() {
    let (connector, mut servers) = MockConnector::script(1);
    let mut server = servers.remove(0);

    let (client, _shutdown) =
        GatewayClient::with_connector(config(), EventDispatcher::new_shared(), connector);
    let task = tokio::spawn(client.run());

    server.send_hello(45_000);
    server.recv_non_heartbeat().await;
    server.close(Some(4004));

    let result = task.await.unwrap();
    assert!(matches!(result, Err(GatewayError::AuthenticationFailed(_))));
}

#[tokio::test(start_paused = true)]
async fn disallowed_intents_are_fatal_but_distinct() {
    let (connector, mut servers) = MockConnector::script(1);
    let mut server = servers.remove(0);

    let (client, _shutdown) =
        GatewayClient::with_connector(config(), EventDispatcher::new_shared(), connector);
    let task = tokio::spawn(client.run());

    server.send_hello(45_000);
    server.recv_non_heartbeat().await;
    server.close(Some(4014));

    let result = task.await.unwrap();
    assert!(matches!(
        result,
        Err(GatewayError::FatalClose { code: 4014, .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn shutdown_mid_handshake_is_clean() {
    let (connector, servers) = MockConnector::script(1);
    // Keep the server end alive but silent: no hello ever arrives
    let _server = servers;

    let (client, shutdown) =
        GatewayClient::with_connector(config(), EventDispatcher::new_shared(), connector);
    let state = client.state();
    let task = tokio::spawn(client.run());

    // Let the client reach the hello wait, then shut down
    tokio::task::yield_now().await;
    shutdown.shutdown();

    task.await.unwrap().unwrap();
    assert_eq!(*state.borrow(), SessionState::Disconnected);
}
