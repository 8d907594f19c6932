use std::time::Duration;

use auditboard::config::DashboardConfig;
use auditboard::protocol::PipelineEvent;
use auditboard::reducer;
use auditboard::session::{AuditSession, StartError};
use auditboard::transport::{ChannelTransport, ConnectionManager, ReadyState};

mod common;
use common::*;

fn test_config() -> DashboardConfig {
    DashboardConfig::new(Some("mem://test".into()))
        .with_retry_interval(Duration::from_millis(10))
}

async fn open_connection(
    transport: &ChannelTransport,
) -> (ConnectionManager, auditboard::transport::ChannelPeer) {
    let peer = transport.stage_link();
    let (connection, _frames) = ConnectionManager::spawn(transport.clone(), &test_config());
    let mut ready = connection.ready_changes();
    while *ready.borrow() != ReadyState::Open {
        ready.changed().await.expect("manager alive");
    }
    (connection, peer)
}

#[tokio::test]
async fn start_rejected_while_connecting() {
    // No staged link: the manager keeps retrying and never opens.
    let transport = ChannelTransport::new();
    let (connection, _frames) = ConnectionManager::spawn(transport, &test_config());

    let mut session = AuditSession::new();
    let err = session
        .start(&connection, "https://example.com/clip")
        .unwrap_err();

    assert!(matches!(err, StartError::NotReady));
    // Rejection mutates nothing.
    assert!(!session.is_running());
    assert_initial_topology(&session);

    connection.shutdown().await;
}

#[tokio::test]
async fn start_rejected_while_already_running() {
    let transport = ChannelTransport::new();
    let (connection, _peer) = open_connection(&transport).await;

    let mut session = AuditSession::new();
    session
        .start(&connection, "https://example.com/one")
        .expect("first start accepted");

    let err = session
        .start(&connection, "https://example.com/two")
        .unwrap_err();
    assert!(matches!(err, StartError::AlreadyRunning));
    assert_eq!(session.resource_locator(), "https://example.com/one");

    connection.shutdown().await;
}

#[tokio::test]
async fn start_resets_substores_and_sends_command() {
    let transport = ChannelTransport::new();
    let (connection, mut peer) = open_connection(&transport).await;

    let mut session = AuditSession::new();
    // Dirty the session with a previous run's leftovers.
    for event in happy_path_events(fail_output()) {
        reducer::apply(&mut session, &event);
    }
    assert!(session.verdict().is_some());
    assert!(!session.log().is_empty());

    session
        .start(&connection, "https://example.com/clip")
        .expect("start accepted");

    assert!(session.is_running());
    assert_initial_topology(&session);
    assert_eq!(session.resource_locator(), "https://example.com/clip");

    let command = peer.next_command().await.expect("command delivered");
    let value: serde_json::Value = serde_json::from_str(&command).unwrap();
    assert_eq!(value["resource_locator"], "https://example.com/clip");

    connection.shutdown().await;
}

#[tokio::test]
async fn restart_after_terminal_outcome_yields_identical_initial_topology() {
    let transport = ChannelTransport::new();
    let (connection, _peer) = open_connection(&transport).await;

    let mut session = AuditSession::new();

    session
        .start(&connection, "https://example.com/first")
        .expect("first start");
    let first_id = session.session_id();
    assert_initial_topology(&session);

    // Backend fails the run; the session becomes startable again.
    reducer::apply(
        &mut session,
        &PipelineEvent::stage_error(Some("indexer".into()), Some("fetch failed".into())),
    );
    assert!(!session.is_running());

    session
        .start(&connection, "https://example.com/second")
        .expect("second start");
    assert_initial_topology(&session);
    assert!(session.is_running());
    assert_ne!(session.session_id(), first_id, "each run gets a fresh id");

    connection.shutdown().await;
}

#[tokio::test]
async fn fresh_session_is_idle() {
    let session = AuditSession::new();
    assert!(!session.is_running());
    assert!(session.resource_locator().is_empty());
    assert_initial_topology(&session);
}
