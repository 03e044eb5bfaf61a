//! The store, middleware and connection manager wired together.

mod common;

use std::time::Duration;

use common::{FakeConnector, Outcome};
use serde_json::json;
use stockroom_client::stores::{Action, RealtimeAction, RealtimeStatus};
use stockroom_client::ws::ReconnectConfig;
use stockroom_client::{ClientConfig, LiveClient};

const URL: &str = "ws://stockroom.test/live";

fn config() -> ClientConfig {
    ClientConfig {
        ws_url: URL.to_string(),
        message_history: 2,
        ..ClientConfig::default()
    }
}

#[tokio::test(start_paused = true)]
async fn live_updates_land_in_the_realtime_slice() {
    let (connector, mut peers) = FakeConnector::new([Outcome::Accept]);
    let client = LiveClient::start_with(config(), connector);

    client.connect();
    let state = client
        .store
        .wait_for(|s| s.realtime.status.is_live())
        .await
        .unwrap();
    assert_eq!(state.realtime.url.as_deref(), Some(URL));

    let mut peer = peers.recv().await.unwrap();
    for seq in 1..=3 {
        peer.push(&json!({ "seq": seq }).to_string());
    }

    let state = client
        .store
        .wait_for(|s| s.realtime.received == 3)
        .await
        .unwrap();
    // Only the newest messages are kept.
    let kept: Vec<_> = state.realtime.messages.iter().cloned().collect();
    assert_eq!(kept, vec![json!({"seq": 2}), json!({"seq": 3})]);
    assert_eq!(state.realtime.last_message(), Some(&json!({"seq": 3})));

    client.send(json!({"type": "subscribe", "topic": "products"}));
    assert_eq!(
        peer.next_frame().await.as_deref(),
        Some(r#"{"topic":"products","type":"subscribe"}"#)
    );

    client.disconnect();
    assert_eq!(peer.next_frame().await, None);
    let state = client
        .store
        .wait_for(|s| s.realtime.status == RealtimeStatus::Idle)
        .await
        .unwrap();
    assert_eq!(state.realtime.received, 3);
}

#[tokio::test(start_paused = true)]
async fn send_requests_never_reach_the_reducers() {
    let (connector, mut peers) = FakeConnector::new([Outcome::Accept]);
    let client = LiveClient::start_with(config(), connector);
    let mut log = client.store.actions();

    client.connect();
    client
        .store
        .wait_for(|s| s.realtime.status.is_live())
        .await
        .unwrap();
    let mut peer = peers.recv().await.unwrap();

    client.send(json!({"n": 1}));
    assert!(peer.next_frame().await.is_some());
    client.disconnect();
    client
        .store
        .wait_for(|s| s.realtime.status == RealtimeStatus::Idle)
        .await
        .unwrap();

    let mut seen = Vec::new();
    while let Ok(Action::Realtime(action)) = log.try_recv() {
        seen.push(action);
    }
    assert_eq!(
        seen,
        vec![
            RealtimeAction::ConnectRequested {
                url: URL.to_string()
            },
            RealtimeAction::ConnectStarted {
                url: URL.to_string()
            },
            RealtimeAction::ConnectSucceeded,
            RealtimeAction::DisconnectRequested,
            RealtimeAction::Disconnected,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn giving_up_is_visible_in_the_store() {
    let (connector, _peers) = FakeConnector::refusing();
    let config = ClientConfig {
        reconnect: ReconnectConfig {
            max_attempts: 2,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_millis(500),
            backoff_multiplier: 1.0,
        },
        ..config()
    };
    let client = LiveClient::start_with(config, connector.clone());

    client.connect();
    client
        .store
        .wait_for(|s| s.realtime.status == RealtimeStatus::Reconnecting { attempt: 2 })
        .await
        .unwrap();
    client
        .store
        .wait_for(|s| s.realtime.status == RealtimeStatus::GaveUp)
        .await
        .unwrap();

    assert_eq!(connector.attempt_count(), 3);
    assert_eq!(
        connector.gaps(),
        vec![Duration::from_millis(500), Duration::from_millis(500)]
    );

    // A fresh connect request leaves the given-up state.
    client.connect();
    client
        .store
        .wait_for(|s| s.realtime.status != RealtimeStatus::GaveUp)
        .await
        .unwrap();
    client.shutdown();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn disconnect_racing_a_server_hang_up_settles_idle() {
    for _ in 0..100 {
        let (connector, mut peers) = FakeConnector::new([Outcome::Accept]);
        let client = LiveClient::start_with(config(), connector.clone());

        client.connect();
        client
            .store
            .wait_for(|s| s.realtime.status.is_live())
            .await
            .unwrap();
        let mut peer = peers.recv().await.unwrap();
        let mut log = client.store.actions();

        peer.hang_up();
        client.disconnect();

        tokio::time::timeout(
            Duration::from_secs(1),
            client
                .store
                .wait_for(|s| s.realtime.status == RealtimeStatus::Idle),
        )
        .await
        .unwrap()
        .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(client.store.state().realtime.status, RealtimeStatus::Idle);
        assert_eq!(connector.attempt_count(), 1);

        // The confirmation is the last thing the slice hears.
        let mut last = None;
        while let Ok(Action::Realtime(action)) = log.try_recv() {
            last = Some(action);
        }
        assert_eq!(last, Some(RealtimeAction::Disconnected));

        client.shutdown();
    }
}
