//! Client configuration from environment variables.

use std::time::Duration;

use url::Url;

use crate::ws::ReconnectConfig;

const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
const DEFAULT_WS_URL: &str = "ws://127.0.0.1:8000";

/// Default number of inbound messages kept in the realtime slice.
pub const DEFAULT_MESSAGE_HISTORY: usize = 500;

/// Runtime configuration for the live-update client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the REST API (http/https).
    pub api_url: String,
    /// Endpoint of the live-update channel (ws/wss).
    pub ws_url: String,
    /// Bearer token attached to API requests.
    pub access_token: Option<String>,
    /// Reconnect policy for the live-update channel.
    pub reconnect: ReconnectConfig,
    /// How many inbound messages the realtime slice keeps.
    pub message_history: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            ws_url: DEFAULT_WS_URL.to_string(),
            access_token: None,
            reconnect: ReconnectConfig::default(),
            message_history: DEFAULT_MESSAGE_HISTORY,
        }
    }
}

impl ClientConfig {
    /// Parse configuration from environment variables.
    ///
    /// Environment variables:
    /// - `STOCKROOM_API_URL`: REST base URL (default: "http://127.0.0.1:8000")
    /// - `STOCKROOM_WS_URL`: live-update endpoint (default: "ws://127.0.0.1:8000")
    /// - `STOCKROOM_ACCESS_TOKEN`: optional bearer token
    /// - `STOCKROOM_WS_MAX_RETRIES`: reconnect attempts before giving up (default: 5)
    /// - `STOCKROOM_WS_RETRY_DELAY_MS`: delay between reconnect attempts (default: 3000)
    /// - `STOCKROOM_MESSAGE_HISTORY`: inbound messages kept in the store (default: 500)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`], reading values through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let api_url = url_var(&lookup, "STOCKROOM_API_URL", &["http", "https"])
            .unwrap_or(defaults.api_url);
        let ws_url = url_var(&lookup, "STOCKROOM_WS_URL", &["ws", "wss"])
            .unwrap_or(defaults.ws_url);
        let access_token = lookup("STOCKROOM_ACCESS_TOKEN").filter(|t| !t.trim().is_empty());

        let mut reconnect = defaults.reconnect;
        if let Some(max) = parsed_var::<u32>(&lookup, "STOCKROOM_WS_MAX_RETRIES") {
            reconnect.max_attempts = max;
        }
        if let Some(ms) = parsed_var::<u64>(&lookup, "STOCKROOM_WS_RETRY_DELAY_MS") {
            reconnect.initial_delay = Duration::from_millis(ms);
            reconnect.max_delay = reconnect.max_delay.max(reconnect.initial_delay);
        }

        let message_history = parsed_var::<usize>(&lookup, "STOCKROOM_MESSAGE_HISTORY")
            .filter(|n| *n > 0)
            .unwrap_or(defaults.message_history);

        Self {
            api_url,
            ws_url,
            access_token,
            reconnect,
            message_history,
        }
    }
}

fn url_var(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    schemes: &[&str],
) -> Option<String> {
    let raw = lookup(key)?;
    match Url::parse(raw.trim()) {
        Ok(parsed) if schemes.contains(&parsed.scheme()) => Some(raw.trim().to_string()),
        Ok(parsed) => {
            crate::log_warn!(
                "{} has unsupported scheme '{}', using default",
                key,
                parsed.scheme()
            );
            None
        }
        Err(e) => {
            crate::log_warn!("{} is not a valid URL ({}), using default", key, e);
            None
        }
    }
}

fn parsed_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            crate::log_warn!("{}='{}' is not a valid number, using default", key, raw);
            None
        }
    }
}
