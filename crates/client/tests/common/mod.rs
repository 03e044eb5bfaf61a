//! In-memory connector for driving the connection manager without sockets.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures_channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use futures_util::{SinkExt, StreamExt};
use stockroom_client::stores::{Action, RealtimeAction};
use stockroom_client::ws::{Channel, Connector};
use stockroom_shared::TransportError;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// What the next connect attempt does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Accept,
    Refuse,
}

/// The server end of an accepted channel.
pub struct Peer {
    pub url: String,
    inbound: Option<UnboundedSender<Result<String, TransportError>>>,
    outbound: UnboundedReceiver<String>,
}

impl Peer {
    /// Push a text frame to the client.
    pub fn push(&self, text: &str) {
        if let Some(tx) = &self.inbound {
            let _ = tx.unbounded_send(Ok(text.to_string()));
        }
    }

    /// Close the channel from the server side.
    pub fn hang_up(&mut self) {
        self.inbound = None;
    }

    /// Next frame written by the client; `None` once the client closed.
    pub async fn next_frame(&mut self) -> Option<String> {
        self.outbound.next().await
    }
}

#[derive(Default)]
struct Script {
    outcomes: VecDeque<Outcome>,
    attempts: Vec<(String, Instant)>,
}

/// Connector that follows a script of outcomes and hands accepted channels
/// to the test. Once the script is exhausted every attempt is refused.
#[derive(Clone)]
pub struct FakeConnector {
    script: Arc<Mutex<Script>>,
    peers: mpsc::UnboundedSender<Peer>,
}

impl FakeConnector {
    pub fn new(
        outcomes: impl IntoIterator<Item = Outcome>,
    ) -> (Self, mpsc::UnboundedReceiver<Peer>) {
        let (peers, peers_rx) = mpsc::unbounded_channel();
        let script = Script {
            outcomes: outcomes.into_iter().collect(),
            attempts: Vec::new(),
        };
        let connector = Self {
            script: Arc::new(Mutex::new(script)),
            peers,
        };
        (connector, peers_rx)
    }

    /// A connector that refuses every attempt.
    pub fn refusing() -> (Self, mpsc::UnboundedReceiver<Peer>) {
        Self::new(Vec::new())
    }

    /// URLs of every connect attempt so far.
    pub fn urls(&self) -> Vec<String> {
        let script = self.script.lock().unwrap();
        script.attempts.iter().map(|(url, _)| url.clone()).collect()
    }

    pub fn attempt_count(&self) -> usize {
        self.script.lock().unwrap().attempts.len()
    }

    /// Time elapsed between consecutive connect attempts.
    pub fn gaps(&self) -> Vec<Duration> {
        let script = self.script.lock().unwrap();
        script
            .attempts
            .windows(2)
            .map(|pair| pair[1].1 - pair[0].1)
            .collect()
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(&self, url: &str) -> Result<Channel, TransportError> {
        let outcome = {
            let mut script = self.script.lock().unwrap();
            script.attempts.push((url.to_string(), Instant::now()));
            script.outcomes.pop_front().unwrap_or(Outcome::Refuse)
        };

        if outcome == Outcome::Refuse {
            return Err(TransportError::Connect(format!("refused: {url}")));
        }

        let (inbound_tx, inbound_rx) = unbounded();
        let (outbound_tx, outbound_rx) = unbounded::<String>();

        let _ = self.peers.send(Peer {
            url: url.to_string(),
            inbound: Some(inbound_tx),
            outbound: outbound_rx,
        });

        Ok(Channel {
            sink: Box::pin(outbound_tx.sink_map_err(|_| TransportError::Closed)),
            stream: Box::pin(inbound_rx),
        })
    }
}

/// The action the manager dispatches when it starts opening `url`.
pub fn started(url: &str) -> RealtimeAction {
    RealtimeAction::ConnectStarted {
        url: url.to_string(),
    }
}

/// Next realtime action, skipping anything else.
pub async fn next_realtime(actions: &mut mpsc::UnboundedReceiver<Action>) -> RealtimeAction {
    loop {
        match actions.recv().await {
            Some(Action::Realtime(action)) => return action,
            Some(_) => continue,
            None => panic!("action channel closed"),
        }
    }
}

/// Assert that nothing else is dispatched within `window`.
pub async fn assert_quiet(actions: &mut mpsc::UnboundedReceiver<Action>, window: Duration) {
    tokio::time::sleep(window).await;
    if let Ok(action) = actions.try_recv() {
        panic!("unexpected action: {action:?}");
    }
}
