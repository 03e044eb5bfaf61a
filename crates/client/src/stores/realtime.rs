//! Realtime slice: status of the live-update channel and the messages it delivered.

use std::collections::VecDeque;

use serde_json::Value;

use crate::config::DEFAULT_MESSAGE_HISTORY;

/// Actions touching the realtime slice.
///
/// `ConnectRequested`, `SendRequested` and `DisconnectRequested` come from
/// callers and are routed to the connection manager by
/// [`crate::ws::RealtimeMiddleware`]. The rest are dispatched by the manager,
/// in the order it made each transition, and only those move `status`.
#[derive(Debug, Clone, PartialEq)]
pub enum RealtimeAction {
    ConnectRequested { url: String },
    SendRequested { payload: Value },
    DisconnectRequested,
    /// The manager started opening a channel to `url`.
    ConnectStarted { url: String },
    ConnectSucceeded,
    ConnectFailed,
    ReconnectScheduled { attempt: u32, delay_ms: u64 },
    GaveUp,
    MessageReceived { value: Value },
    /// The manager closed the channel and cancelled any pending reconnect.
    Disconnected,
}

/// What the UI should show about live updates.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RealtimeStatus {
    #[default]
    Idle,
    Connecting,
    Live,
    Reconnecting { attempt: u32 },
    Disconnected,
    /// Live updates are unavailable until the caller connects again.
    GaveUp,
}

impl RealtimeStatus {
    pub fn is_live(&self) -> bool {
        matches!(self, RealtimeStatus::Live)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RealtimeState {
    pub status: RealtimeStatus,
    /// Endpoint of the most recent connect request.
    pub url: Option<String>,
    /// Most recent inbound messages, oldest first.
    pub messages: VecDeque<Value>,
    /// Total messages received since the store started.
    pub received: u64,
    history_limit: usize,
}

impl Default for RealtimeState {
    fn default() -> Self {
        Self::with_history(DEFAULT_MESSAGE_HISTORY)
    }
}

impl RealtimeState {
    pub fn with_history(history_limit: usize) -> Self {
        Self {
            status: RealtimeStatus::Idle,
            url: None,
            messages: VecDeque::new(),
            received: 0,
            history_limit: history_limit.max(1),
        }
    }

    /// The most recently received message.
    pub fn last_message(&self) -> Option<&Value> {
        self.messages.back()
    }
}

pub fn reduce(state: &mut RealtimeState, action: &RealtimeAction) {
    match action {
        // Requests only become status once the manager acts on them.
        RealtimeAction::ConnectRequested { .. }
        | RealtimeAction::SendRequested { .. }
        | RealtimeAction::DisconnectRequested => {}
        RealtimeAction::ConnectStarted { url } => {
            state.status = RealtimeStatus::Connecting;
            state.url = Some(url.clone());
        }
        RealtimeAction::Disconnected => state.status = RealtimeStatus::Idle,
        RealtimeAction::ConnectSucceeded => state.status = RealtimeStatus::Live,
        RealtimeAction::ConnectFailed => state.status = RealtimeStatus::Disconnected,
        RealtimeAction::ReconnectScheduled { attempt, .. } => {
            state.status = RealtimeStatus::Reconnecting { attempt: *attempt }
        }
        RealtimeAction::GaveUp => state.status = RealtimeStatus::GaveUp,
        RealtimeAction::MessageReceived { value } => {
            if state.messages.len() >= state.history_limit {
                state.messages.pop_front();
            }
            state.messages.push_back(value.clone());
            state.received += 1;
        }
    }
}
