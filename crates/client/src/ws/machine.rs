//! Connection state machine.
//!
//! All lifecycle decisions live here as a pure transition function: the
//! manager feeds in an [`Event`] and executes the returned [`Effect`]s. No
//! sockets or timers are touched, so every transition can be tested directly.
//!
//! ```text
//!            connect                opened
//!   Idle ─────────────▶ Connecting ───────▶ Open
//!    ▲                    ▲    │              │ closed
//!    │ disconnect         │    │ closed       ▼
//!    │ (from any state)   └────┴───────── Closed ──(retries spent)──▶ GaveUp
//!                        retry elapsed
//! ```
//!
//! Every channel and every reconnect timer carries the generation that was
//! current when it was created. Events from an older generation are stale and
//! ignored, which is what keeps a replaced channel or an already-fired timer
//! from touching state after `connect`/`disconnect`.

use std::time::Duration;

use serde_json::Value;
use stockroom_shared::{decode_frame, encode_frame};

use super::connection::ReconnectConfig;
use crate::stores::RealtimeAction;

/// Connection state for the live-update channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    /// No channel and nothing scheduled.
    Idle,
    /// A channel is being opened. `attempt` is 0 for the initial connect.
    Connecting { attempt: u32 },
    /// The channel is open.
    Open,
    /// The channel closed unexpectedly; reconnect `attempt` is scheduled.
    Closed { attempt: u32 },
    /// Reconnect attempts are exhausted. Only an explicit connect leaves this state.
    GaveUp,
}

impl ConnectionState {
    pub fn is_open(&self) -> bool {
        matches!(self, ConnectionState::Open)
    }

    /// Whether a channel handle exists in this state.
    fn has_channel(&self) -> bool {
        matches!(
            self,
            ConnectionState::Connecting { .. } | ConnectionState::Open
        )
    }
}

/// Inputs to the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Caller asked to connect to `url`.
    Connect { url: String },
    /// Caller asked to send `payload`.
    Send { payload: Value },
    /// Caller asked to disconnect.
    Disconnect,
    /// The channel of `generation` finished its opening handshake.
    Opened { generation: u64 },
    /// The channel of `generation` closed or failed to open.
    Closed { generation: u64 },
    /// The channel of `generation` delivered a text frame.
    Received { generation: u64, text: String },
    /// The reconnect timer of `generation` elapsed.
    RetryElapsed { generation: u64 },
}

/// Side effects requested by a transition, executed in order by the manager.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Open a channel to `url`, tagging its events with `generation`.
    Open { url: String, generation: u64 },
    /// Close and release the current channel handle.
    Close,
    /// Write a text frame to the current channel.
    Write(String),
    /// Fire [`Event::RetryElapsed`] for `generation` after `delay`.
    ScheduleRetry { delay: Duration, generation: u64 },
    /// Cancel the pending reconnect timer.
    CancelRetry,
    /// Dispatch an action into the store.
    Dispatch(RealtimeAction),
}

/// The connection state machine.
#[derive(Debug, Clone)]
pub struct Machine {
    state: ConnectionState,
    config: ReconnectConfig,
    url: Option<String>,
    retries: u32,
    generation: u64,
}

impl Machine {
    pub fn new(config: ReconnectConfig) -> Self {
        Self {
            state: ConnectionState::Idle,
            config,
            url: None,
            retries: 0,
            generation: 0,
        }
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    /// Consecutive unexpected closes since the last successful open.
    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Apply `event` and return the effects to execute.
    pub fn handle(&mut self, event: Event) -> Vec<Effect> {
        match event {
            Event::Connect { url } => self.on_connect(url),
            Event::Send { payload } => self.on_send(&payload),
            Event::Disconnect => self.on_disconnect(),
            Event::Opened { generation } => self.on_opened(generation),
            Event::Closed { generation } => self.on_closed(generation),
            Event::Received { generation, text } => self.on_received(generation, &text),
            Event::RetryElapsed { generation } => self.on_retry_elapsed(generation),
        }
    }

    /// Effects that release whatever the current state holds.
    fn release(&self) -> Vec<Effect> {
        match self.state {
            ConnectionState::Closed { .. } => vec![Effect::CancelRetry],
            ref s if s.has_channel() => vec![Effect::Close],
            _ => Vec::new(),
        }
    }

    fn on_connect(&mut self, url: String) -> Vec<Effect> {
        let mut effects = self.release();

        self.generation += 1;
        self.retries = 0;
        self.url = Some(url.clone());
        self.state = ConnectionState::Connecting { attempt: 0 };

        effects.push(Effect::Dispatch(RealtimeAction::ConnectStarted { url: url.clone() }));
        effects.push(Effect::Open {
            url,
            generation: self.generation,
        });
        effects
    }

    fn on_disconnect(&mut self) -> Vec<Effect> {
        let mut effects = self.release();

        self.generation += 1;
        self.retries = 0;
        self.state = ConnectionState::Idle;

        // Last word on this connection; anything older is stale from here on.
        effects.push(Effect::Dispatch(RealtimeAction::Disconnected));
        effects
    }

    fn on_send(&self, payload: &Value) -> Vec<Effect> {
        if !self.state.is_open() {
            crate::log_debug!("Dropping send while {:?}", self.state);
            return Vec::new();
        }
        match encode_frame(payload) {
            Ok(text) => vec![Effect::Write(text)],
            Err(e) => {
                crate::log_error!("Serialize failed: {}", e);
                Vec::new()
            }
        }
    }

    fn on_opened(&mut self, generation: u64) -> Vec<Effect> {
        if generation != self.generation
            || !matches!(self.state, ConnectionState::Connecting { .. })
        {
            return Vec::new();
        }

        self.state = ConnectionState::Open;
        self.retries = 0;
        vec![Effect::Dispatch(RealtimeAction::ConnectSucceeded)]
    }

    fn on_closed(&mut self, generation: u64) -> Vec<Effect> {
        if generation != self.generation || !self.state.has_channel() {
            return Vec::new();
        }

        let mut effects = vec![
            Effect::Close,
            Effect::Dispatch(RealtimeAction::ConnectFailed),
        ];

        // Anything still in flight from the dead channel is now stale.
        self.generation += 1;

        if self.retries >= self.config.max_attempts {
            crate::log_warn!(
                "Max reconnect attempts ({}) reached, giving up",
                self.config.max_attempts
            );
            self.state = ConnectionState::GaveUp;
            effects.push(Effect::Dispatch(RealtimeAction::GaveUp));
            return effects;
        }

        self.retries += 1;
        let attempt = self.retries;
        let delay = self.config.delay_for_attempt(attempt);
        self.state = ConnectionState::Closed { attempt };

        crate::log_info!(
            "Reconnecting in {}ms (attempt {}/{})",
            delay.as_millis(),
            attempt,
            self.config.max_attempts
        );

        effects.push(Effect::ScheduleRetry {
            delay,
            generation: self.generation,
        });
        effects.push(Effect::Dispatch(RealtimeAction::ReconnectScheduled {
            attempt,
            delay_ms: delay.as_millis() as u64,
        }));
        effects
    }

    fn on_received(&self, generation: u64, text: &str) -> Vec<Effect> {
        if generation != self.generation || !self.state.is_open() {
            return Vec::new();
        }
        match decode_frame(text) {
            Ok(value) => vec![Effect::Dispatch(RealtimeAction::MessageReceived { value })],
            Err(e) => {
                crate::log_warn!("Dropping malformed message: {}", e);
                Vec::new()
            }
        }
    }

    fn on_retry_elapsed(&mut self, generation: u64) -> Vec<Effect> {
        let ConnectionState::Closed { attempt } = self.state else {
            return Vec::new();
        };
        if generation != self.generation {
            return Vec::new();
        }
        let Some(url) = self.url.clone() else {
            return Vec::new();
        };

        self.generation += 1;
        self.state = ConnectionState::Connecting { attempt };
        vec![Effect::Open {
            url,
            generation: self.generation,
        }]
    }
}
