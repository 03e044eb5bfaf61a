//! Store middleware that routes realtime requests to the connection manager.

use super::manager::WsHandle;
use crate::stores::{Action, Flow, Middleware, RealtimeAction};

/// Forwards connect/send/disconnect requests to a [`WsHandle`].
///
/// Sends are consumed here. Connect and disconnect continue to the reducers
/// for the action log, but the realtime status only changes once the manager
/// dispatches `ConnectStarted` or `Disconnected`.
pub struct RealtimeMiddleware {
    ws: WsHandle,
}

impl RealtimeMiddleware {
    pub fn new(ws: WsHandle) -> Self {
        Self { ws }
    }
}

impl Middleware for RealtimeMiddleware {
    fn handle(&mut self, action: &Action) -> Flow {
        let Action::Realtime(action) = action else {
            return Flow::Next;
        };

        match action {
            RealtimeAction::ConnectRequested { url } => {
                self.ws.connect(url.clone());
                Flow::Next
            }
            RealtimeAction::SendRequested { payload } => {
                self.ws.send(payload.clone());
                Flow::Consumed
            }
            RealtimeAction::DisconnectRequested => {
                self.ws.disconnect();
                Flow::Next
            }
            _ => Flow::Next,
        }
    }
}
