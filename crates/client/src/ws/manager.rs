//! Connection manager task for the live-update channel.
//!
//! The manager owns the [`Machine`], the current channel handle and the
//! pending reconnect timer. Caller commands and channel/timer events arrive
//! on two queues and are processed one at a time, so the machine never sees
//! two events concurrently.

use std::sync::Arc;

use futures_channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::connection::{Channel, Connector, ReconnectConfig};
use super::machine::{Effect, Event, Machine};
use crate::stores::Dispatcher;

/// Commands accepted by the manager.
#[derive(Debug, Clone)]
enum Command {
    Connect(String),
    Send(Value),
    Disconnect,
    Shutdown,
}

impl From<Command> for Event {
    fn from(cmd: Command) -> Self {
        match cmd {
            Command::Connect(url) => Event::Connect { url },
            Command::Send(payload) => Event::Send { payload },
            Command::Disconnect | Command::Shutdown => Event::Disconnect,
        }
    }
}

/// Handle for driving a running [`ConnectionManager`].
///
/// Every method is fire-and-forget: none of them fail, and outcomes are only
/// visible through the actions the manager dispatches into the store.
#[derive(Debug, Clone)]
pub struct WsHandle {
    commands: mpsc::UnboundedSender<Command>,
}

impl WsHandle {
    fn command(&self, cmd: Command) {
        if self.commands.send(cmd).is_err() {
            crate::log_debug!("Connection manager has stopped, ignoring command");
        }
    }

    /// Close any existing channel and open a new one to `url`.
    pub fn connect(&self, url: impl Into<String>) {
        self.command(Command::Connect(url.into()));
    }

    /// Write `payload` if the channel is open; otherwise drop it.
    pub fn send(&self, payload: Value) {
        self.command(Command::Send(payload));
    }

    /// Close the channel and cancel any pending reconnect.
    pub fn disconnect(&self) {
        self.command(Command::Disconnect);
    }

    /// Disconnect and stop the manager task.
    pub fn shutdown(&self) {
        self.command(Command::Shutdown);
    }
}

/// The manager's side of one channel: writes go through `outbound`, and
/// dropping it tells the channel task to close.
struct ChannelHandle {
    outbound: UnboundedSender<String>,
}

/// Owns one logical live-update connection.
pub struct ConnectionManager<C: Connector> {
    machine: Machine,
    connector: Arc<C>,
    dispatcher: Dispatcher,
    commands: mpsc::UnboundedReceiver<Command>,
    events_tx: mpsc::UnboundedSender<Event>,
    events: mpsc::UnboundedReceiver<Event>,
    channel: Option<ChannelHandle>,
    retry_timer: Option<JoinHandle<()>>,
}

impl<C: Connector> ConnectionManager<C> {
    /// Start a manager task that opens channels through `connector` and
    /// reports lifecycle actions to `dispatcher`.
    pub fn spawn(connector: C, config: ReconnectConfig, dispatcher: Dispatcher) -> WsHandle {
        let (commands_tx, commands) = mpsc::unbounded_channel();
        let (events_tx, events) = mpsc::unbounded_channel();

        let manager = Self {
            machine: Machine::new(config),
            connector: Arc::new(connector),
            dispatcher,
            commands,
            events_tx,
            events,
            channel: None,
            retry_timer: None,
        };

        tokio::spawn(manager.run());

        WsHandle {
            commands: commands_tx,
        }
    }

    async fn run(mut self) {
        loop {
            let event = tokio::select! {
                // Caller commands first so a disconnect beats queued channel events.
                biased;
                cmd = self.commands.recv() => match cmd {
                    Some(Command::Shutdown) | None => break,
                    Some(cmd) => Event::from(cmd),
                },
                Some(event) = self.events.recv() => event,
            };

            self.handle(event);
        }

        self.handle(Event::Disconnect);
        crate::log_info!("Connection manager stopped");
    }

    fn handle(&mut self, event: Event) {
        for effect in self.machine.handle(event) {
            self.apply(effect);
        }
        crate::log_debug!("Connection state: {:?}", self.machine.state());
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::Open { url, generation } => self.open(url, generation),
            Effect::Close => self.close(),
            Effect::Write(text) => match &self.channel {
                Some(channel) => {
                    if channel.outbound.unbounded_send(text).is_err() {
                        crate::log_debug!("Channel writer is gone, dropping frame");
                    }
                }
                None => crate::log_debug!("No channel, dropping frame"),
            },
            Effect::ScheduleRetry { delay, generation } => {
                self.cancel_retry();
                let events = self.events_tx.clone();
                self.retry_timer = Some(tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = events.send(Event::RetryElapsed { generation });
                }));
            }
            Effect::CancelRetry => self.cancel_retry(),
            Effect::Dispatch(action) => self.dispatcher.dispatch(action),
        }
    }

    fn open(&mut self, url: String, generation: u64) {
        // At most one channel handle exists at a time.
        self.close();

        crate::log_info!("Opening live-update channel to {} (generation {})", url, generation);

        let (outbound, receiver) = unbounded();
        tokio::spawn(run_channel(
            self.connector.clone(),
            url,
            generation,
            receiver,
            self.events_tx.clone(),
        ));

        self.channel = Some(ChannelHandle { outbound });
    }

    fn close(&mut self) {
        if let Some(channel) = self.channel.take() {
            crate::log_debug!("Releasing channel handle");
            drop(channel);
        }
    }

    fn cancel_retry(&mut self) {
        if let Some(timer) = self.retry_timer.take() {
            timer.abort();
        }
    }
}

/// Drive one channel until it closes or its handle is released.
///
/// Reports `Opened`, `Received` and `Closed` for `generation`. A released
/// handle closes the channel quietly: the manager already moved on, so no
/// `Closed` is reported.
async fn run_channel<C: Connector>(
    connector: Arc<C>,
    url: String,
    generation: u64,
    mut outbound: UnboundedReceiver<String>,
    events: mpsc::UnboundedSender<Event>,
) {
    let attempt = tokio::select! {
        result = connector.connect(&url) => result,
        None = outbound.next() => {
            crate::log_debug!("Channel released before it opened");
            return;
        }
    };

    let Channel { mut sink, mut stream } = match attempt {
        Ok(channel) => channel,
        Err(e) => {
            crate::log_error!("WebSocket error for {}: {}", url, e);
            let _ = events.send(Event::Closed { generation });
            return;
        }
    };

    crate::log_info!("WebSocket connected to {}", url);
    let _ = events.send(Event::Opened { generation });

    loop {
        tokio::select! {
            frame = stream.next() => match frame {
                Some(Ok(text)) => {
                    crate::log_debug!("WebSocket received: {}", text);
                    let _ = events.send(Event::Received { generation, text });
                }
                Some(Err(e)) => {
                    crate::log_error!("WebSocket read error: {}", e);
                    break;
                }
                None => {
                    crate::log_info!("WebSocket to {} closed by peer", url);
                    break;
                }
            },
            out = outbound.next() => match out {
                Some(text) => {
                    crate::log_debug!("Sending to {}: {}", url, text);
                    if let Err(e) = sink.send(text).await {
                        crate::log_error!("Send failed: {}", e);
                        break;
                    }
                }
                None => {
                    let _ = sink.close().await;
                    crate::log_info!("WebSocket to {} closed", url);
                    return;
                }
            },
        }
    }

    let _ = events.send(Event::Closed { generation });
}
