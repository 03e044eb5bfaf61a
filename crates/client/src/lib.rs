//! Stockroom Client - live inventory updates
//!
//! This crate contains the client side of the stockroom inventory system:
//! a reconnecting live-update channel bridged into an application state
//! store, plus the product slice and the REST calls that feed it.

pub mod logging;

pub mod api_client;
pub mod app;
pub mod config;
pub mod stores;
pub mod ws;

pub use api_client::ApiClient;
pub use app::LiveClient;
pub use config::ClientConfig;
pub use stores::{Action, AppState, StoreHandle};
