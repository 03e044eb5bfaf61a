//! WebSocket module for live inventory updates.
//!
//! This module provides:
//! - A pure connection state machine with bounded reconnect
//! - A manager task that executes the machine's effects
//! - Store middleware, so callers only ever dispatch actions
//!
//! # Architecture
//!
//! ```text
//!   caller ──dispatch──▶ ┌──────────────┐  ConnectRequested / SendRequested /
//!                        │    Store     │  DisconnectRequested
//!                        │ (middleware) │─────────────────────────┐
//!                        └──────────────┘                         ▼
//!                              ▲                        ┌───────────────────┐
//!                              │ ConnectStarted,        │ ConnectionManager │
//!                              │ Disconnected, ...      │   (Machine)       │
//!                              └────────────────────────└───────────────────┘
//!                                                                 │
//!                                                         Connector / Channel
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! let (store, handle) = Store::new(AppState::default());
//! let ws = ConnectionManager::spawn(
//!     TungsteniteConnector::new(),
//!     ReconnectConfig::default(),
//!     handle.dispatcher(),
//! );
//! store.with_middleware(RealtimeMiddleware::new(ws)).spawn();
//!
//! handle.dispatch(RealtimeAction::ConnectRequested { url: "ws://127.0.0.1:8000".into() });
//! let live = handle.wait_for(|s| s.realtime.status.is_live()).await;
//! ```

mod connection;
mod machine;
mod manager;
mod middleware;

// Re-export connection types
pub use connection::{
    Channel, Connector, FrameSink, FrameStream, ReconnectConfig, TungsteniteConnector,
};

pub use machine::{ConnectionState, Effect, Event, Machine};
pub use manager::{ConnectionManager, WsHandle};
pub use middleware::RealtimeMiddleware;
