//! Transport seam for the live-update channel.
//!
//! This module provides the reconnect policy, the [`Connector`] trait the
//! manager opens channels through, and the tokio-tungstenite implementation.

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{Sink, Stream};
use stockroom_shared::TransportError;

/// Configuration for auto-reconnect behavior
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectConfig {
    /// Maximum number of consecutive reconnect attempts (0 = never reconnect)
    pub max_attempts: u32,
    /// Delay before the first reconnect attempt
    pub initial_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
    /// Multiplier for exponential backoff (1.0 = constant delay)
    pub backoff_multiplier: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(3000),
            max_delay: Duration::from_millis(3000),
            backoff_multiplier: 1.0,
        }
    }
}

impl ReconnectConfig {
    /// Calculate delay before reconnect attempt `attempt` (1-based)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if self.backoff_multiplier <= 1.0 || !self.backoff_multiplier.is_finite() {
            return self.initial_delay.min(self.max_delay);
        }
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        Duration::from_secs_f64(secs.min(self.max_delay.as_secs_f64()))
    }
}

/// Outbound half of an open channel: accepts text frames.
pub type FrameSink = Pin<Box<dyn Sink<String, Error = TransportError> + Send>>;

/// Inbound half of an open channel: yields text frames until the peer closes.
///
/// The stream ends on a close frame; a transport failure is yielded as an
/// error and nothing after it is read.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<String, TransportError>> + Send>>;

/// An open live-update channel, split into its two halves.
pub struct Channel {
    pub sink: FrameSink,
    pub stream: FrameStream,
}

/// Opens channels to an endpoint.
///
/// The connection manager owns one connector and calls it for every
/// (re)connect attempt. Tests substitute an in-memory implementation.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    async fn connect(&self, url: &str) -> Result<Channel, TransportError>;
}

mod connection_native;
pub use connection_native::TungsteniteConnector;
