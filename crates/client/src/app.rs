//! Wiring for a complete live-update client.

use serde_json::Value;

use crate::api_client::ApiClient;
use crate::config::ClientConfig;
use crate::stores::{AppState, RealtimeAction, Store, StoreHandle};
use crate::ws::{ConnectionManager, Connector, RealtimeMiddleware, TungsteniteConnector, WsHandle};

/// Store, connection manager and API client started together.
///
/// Must be created inside a tokio runtime.
#[derive(Debug, Clone)]
pub struct LiveClient {
    pub config: ClientConfig,
    pub store: StoreHandle,
    pub ws: WsHandle,
    pub api: ApiClient,
}

impl LiveClient {
    /// Start a client that talks to real WebSocket endpoints.
    pub fn start(config: ClientConfig) -> Self {
        Self::start_with(config, TungsteniteConnector::new())
    }

    /// Start a client that opens channels through `connector`.
    pub fn start_with<C: Connector>(config: ClientConfig, connector: C) -> Self {
        let (store, handle) = Store::new(AppState::new(config.message_history));
        let ws = ConnectionManager::spawn(connector, config.reconnect.clone(), handle.dispatcher());
        store
            .with_middleware(RealtimeMiddleware::new(ws.clone()))
            .spawn();

        let api = ApiClient::new()
            .with_base_url(config.api_url.clone())
            .with_access_token(config.access_token.clone());

        crate::log_info!(
            "Client started (api: {}, live updates: {})",
            config.api_url,
            config.ws_url
        );

        Self {
            config,
            store: handle,
            ws,
            api,
        }
    }

    /// Connect to the configured live-update endpoint.
    pub fn connect(&self) {
        self.connect_to(self.config.ws_url.clone());
    }

    /// Connect to `url`, replacing any current connection.
    pub fn connect_to(&self, url: impl Into<String>) {
        self.store
            .dispatch(RealtimeAction::ConnectRequested { url: url.into() });
    }

    /// Send `payload` if live; dropped otherwise.
    pub fn send(&self, payload: Value) {
        self.store.dispatch(RealtimeAction::SendRequested { payload });
    }

    pub fn disconnect(&self) {
        self.store.dispatch(RealtimeAction::DisconnectRequested);
    }

    /// Disconnect and stop the connection manager.
    pub fn shutdown(&self) {
        self.disconnect();
        self.ws.shutdown();
    }
}
