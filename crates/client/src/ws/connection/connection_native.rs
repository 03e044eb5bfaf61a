//! Native WebSocket implementation using tokio-tungstenite.

use async_trait::async_trait;
use futures_util::{future, stream, SinkExt, StreamExt};
use stockroom_shared::TransportError;
use tokio_tungstenite::{connect_async, tungstenite, tungstenite::Message};

use super::{Channel, Connector};

/// Opens real WebSocket connections.
#[derive(Debug, Clone, Default)]
pub struct TungsteniteConnector;

impl TungsteniteConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for TungsteniteConnector {
    async fn connect(&self, url: &str) -> Result<Channel, TransportError> {
        let (ws_stream, _response) = connect_async(url)
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        let (write, read) = ws_stream.split();

        let sink = write
            .with(|text: String| {
                future::ready(Ok::<_, tungstenite::Error>(Message::Text(text.into())))
            })
            .sink_map_err(|e| TransportError::Io(e.to_string()));

        let frames = stream::unfold(read, |mut read| async move {
            loop {
                let Some(msg) = read.next().await else {
                    return None;
                };
                match msg {
                    Ok(Message::Text(text)) => return Some((Ok(text.as_str().to_owned()), read)),
                    Ok(Message::Close(frame)) => {
                        crate::log_debug!("WebSocket received close frame: {:?}", frame);
                        return None;
                    }
                    Ok(Message::Ping(data)) => {
                        // Pong is handled automatically by tungstenite
                        crate::log_debug!("Received ping: {:?}", data);
                    }
                    Ok(_) => {
                        // Ignore binary, pong, etc.
                    }
                    Err(e) => return Some((Err(TransportError::Io(e.to_string())), read)),
                }
            }
        });

        Ok(Channel {
            sink: Box::pin(sink),
            stream: Box::pin(frames),
        })
    }
}
