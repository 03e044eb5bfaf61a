//! Real WebSocket round trips against a local axum server.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use serde_json::json;
use stockroom_client::stores::{Action, RealtimeAction, RealtimeStatus};
use stockroom_client::ws::ReconnectConfig;
use stockroom_client::{ClientConfig, LiveClient};
use tokio::net::TcpListener;

#[derive(Clone, Copy)]
enum Behavior {
    /// Greet, then echo every text frame back.
    Echo,
    /// Close right after the handshake.
    HangUp,
}

struct ServerState {
    behavior: Behavior,
    connections: AtomicUsize,
}

async fn start_server(behavior: Behavior) -> std::io::Result<(String, Arc<ServerState>)> {
    let state = Arc::new(ServerState {
        behavior,
        connections: AtomicUsize::new(0),
    });
    let app = Router::new()
        .route("/live", get(live))
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Ok((format!("ws://{addr}/live"), state))
}

async fn live(ws: WebSocketUpgrade, State(state): State<Arc<ServerState>>) -> Response {
    state.connections.fetch_add(1, Ordering::SeqCst);
    let behavior = state.behavior;
    ws.on_upgrade(move |socket| serve_socket(socket, behavior))
}

async fn serve_socket(mut socket: WebSocket, behavior: Behavior) {
    match behavior {
        Behavior::HangUp => {
            let _ = socket.send(Message::Close(None)).await;
        }
        Behavior::Echo => {
            let _ = socket.send(Message::Binary(vec![0, 1, 2].into())).await;
            let _ = socket.send(Message::Text("definitely not json".into())).await;
            let _ = socket
                .send(Message::Text(r#"{"event":"hello"}"#.into()))
                .await;

            while let Some(Ok(msg)) = socket.recv().await {
                match msg {
                    Message::Text(text) => {
                        if socket.send(Message::Text(text)).await.is_err() {
                            break;
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    }
}

fn config(ws_url: String, reconnect: ReconnectConfig) -> ClientConfig {
    ClientConfig {
        ws_url,
        reconnect,
        ..ClientConfig::default()
    }
}

#[tokio::test]
async fn messages_flow_both_ways_over_a_real_socket() {
    let (url, server) = start_server(Behavior::Echo).await.unwrap();
    let client = LiveClient::start(config(url, ReconnectConfig::default()));

    client.connect();
    let state = tokio::time::timeout(
        Duration::from_secs(5),
        client.store.wait_for(|s| s.realtime.received == 1),
    )
    .await
    .unwrap()
    .unwrap();
    // Binary and malformed frames never reach the store.
    assert_eq!(state.realtime.last_message(), Some(&json!({"event": "hello"})));
    assert!(state.realtime.status.is_live());

    client.send(json!({"op": "echo", "id": 9}));
    let state = tokio::time::timeout(
        Duration::from_secs(5),
        client.store.wait_for(|s| s.realtime.received == 2),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(
        state.realtime.last_message(),
        Some(&json!({"op": "echo", "id": 9}))
    );

    client.shutdown();
    assert_eq!(server.connections.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn hang_ups_after_a_successful_open_keep_reconnecting() {
    let (url, server) = start_server(Behavior::HangUp).await.unwrap();
    let reconnect = ReconnectConfig {
        max_attempts: 2,
        initial_delay: Duration::from_millis(20),
        max_delay: Duration::from_millis(20),
        backoff_multiplier: 1.0,
    };
    let client = LiveClient::start(config(url, reconnect));

    client.connect();
    // Every open resets the retry count, so the client outlasts the limit.
    tokio::time::timeout(Duration::from_secs(5), async {
        while server.connections.load(Ordering::SeqCst) < 5 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    let status = client.store.select(|s| s.realtime.status.clone());
    assert_ne!(status, RealtimeStatus::GaveUp);
    client.shutdown();
}

#[tokio::test]
async fn refused_connections_give_up_after_the_retry_limit() {
    // Bind and drop to get a port nothing listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let reconnect = ReconnectConfig {
        max_attempts: 3,
        initial_delay: Duration::from_millis(20),
        max_delay: Duration::from_millis(20),
        backoff_multiplier: 1.0,
    };
    let client = LiveClient::start(config(format!("ws://{addr}/live"), reconnect));
    let mut log = client.store.actions();

    client.connect();
    tokio::time::timeout(
        Duration::from_secs(5),
        client
            .store
            .wait_for(|s| s.realtime.status == RealtimeStatus::GaveUp),
    )
    .await
    .unwrap()
    .unwrap();

    let mut scheduled = Vec::new();
    while let Ok(action) = log.try_recv() {
        if let Action::Realtime(RealtimeAction::ReconnectScheduled { attempt, delay_ms }) = action {
            scheduled.push((attempt, delay_ms));
        }
    }
    assert_eq!(scheduled, vec![(1, 20), (2, 20), (3, 20)]);
    client.shutdown();
}
