//! Forwards bus events to WebSocket clients.

use std::sync::Arc;

use axum::extract::ws::Message;
use signage_events::SignageEvent;
use tokio::sync::broadcast;

use crate::ws::WsManager;

/// Relays every [`SignageEvent`] to the interested WebSocket connections
/// as a JSON text frame.
pub struct EventRelay {
    ws_manager: Arc<WsManager>,
}

impl EventRelay {
    pub fn new(ws_manager: Arc<WsManager>) -> Self {
        Self { ws_manager }
    }

    /// Run until the event bus is dropped.
    pub async fn run(self, mut receiver: broadcast::Receiver<SignageEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => self.relay(&event).await,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Event relay lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, event relay shutting down");
                    break;
                }
            }
        }
    }

    async fn relay(&self, event: &SignageEvent) {
        let text = match serde_json::to_string(event) {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(error = %e, event_type = %event.event_type, "Failed to serialize event");
                return;
            }
        };
        let delivered = self
            .ws_manager
            .send_event(event, Message::Text(text.into()))
            .await;
        tracing::trace!(event_type = %event.event_type, delivered, "Event relayed");
    }
}
