use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::ws::Message;
use signage_core::{DbId, Timestamp};
use signage_events::names::ENTITY_SCREEN;
use signage_events::SignageEvent;
use tokio::sync::{mpsc, RwLock};

/// Channel sender half for pushing messages to a WebSocket connection.
pub type WsSender = mpsc::UnboundedSender<Message>;

/// Metadata for a single WebSocket connection.
pub struct WsConnection {
    /// Screen the connection follows; `None` receives every event.
    pub screen_id: Option<DbId>,
    /// Channel sender for outbound messages to this connection.
    pub sender: WsSender,
    /// When this connection was established.
    pub connected_at: Timestamp,
}

impl WsConnection {
    /// Whether `event` should be delivered to this connection.
    fn wants(&self, event: &SignageEvent) -> bool {
        match self.screen_id {
            None => true,
            Some(screen_id) => {
                event.source_entity_type.as_deref() == Some(ENTITY_SCREEN)
                    && event.source_entity_id == Some(screen_id)
            }
        }
    }
}

/// Manages all active WebSocket connections.
///
/// Thread-safe via interior `RwLock`; designed to be wrapped in `Arc` and
/// shared across the application.
pub struct WsManager {
    connections: RwLock<HashMap<String, WsConnection>>,
}

impl WsManager {
    /// Create a new, empty connection manager.
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new connection.
    ///
    /// Returns the receiver half of the message channel so the caller can
    /// forward messages to the WebSocket sink.
    pub async fn add(
        &self,
        conn_id: String,
        screen_id: Option<DbId>,
    ) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = WsConnection {
            screen_id,
            sender: tx,
            connected_at: chrono::Utc::now(),
        };
        self.connections.write().await.insert(conn_id, conn);
        rx
    }

    /// Remove a connection by its ID.
    pub async fn remove(&self, conn_id: &str) {
        self.connections.write().await.remove(conn_id);
    }

    /// Broadcast a message to all connected clients.
    ///
    /// Connections whose send channels are closed are skipped; they are
    /// cleaned up when their receive loop ends.
    pub async fn broadcast(&self, message: Message) {
        let conns = self.connections.read().await;
        for conn in conns.values() {
            let _ = conn.sender.send(message.clone());
        }
    }

    /// Send a serialized event to every connection interested in it.
    ///
    /// Returns the number of connections the message was queued for.
    pub async fn send_event(&self, event: &SignageEvent, message: Message) -> usize {
        let conns = self.connections.read().await;
        let mut count = 0;
        for conn in conns.values().filter(|c| c.wants(event)) {
            if conn.sender.send(message.clone()).is_ok() {
                count += 1;
            }
        }
        count
    }

    /// Return the current number of active connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Send a Close frame to every connection, then clear the map.
    pub async fn shutdown_all(&self) {
        let mut conns = self.connections.write().await;
        let count = conns.len();
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Close(None));
        }
        conns.clear();
        tracing::info!(count, "Closed all WebSocket connections");
    }

    /// Send a Ping frame to every connected client.
    pub async fn ping_all(&self) {
        let conns = self.connections.read().await;
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Ping(Bytes::new()));
        }
    }
}

impl Default for WsManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use signage_events::names;

    use super::*;

    fn text(s: &str) -> Message {
        Message::Text(s.to_string().into())
    }

    #[tokio::test]
    async fn add_and_remove_connections() {
        let manager = WsManager::new();
        let _rx = manager.add("a".into(), None).await;
        let _rx2 = manager.add("b".into(), Some(3)).await;
        assert_eq!(manager.connection_count().await, 2);

        manager.remove("a").await;
        assert_eq!(manager.connection_count().await, 1);
    }

    #[tokio::test]
    async fn screen_connections_only_get_their_screen() {
        let manager = WsManager::new();
        let mut admin = manager.add("admin".into(), None).await;
        let mut player = manager.add("player".into(), Some(7)).await;
        let mut other = manager.add("other".into(), Some(8)).await;

        let event = SignageEvent::new(names::SCREEN_UPDATED).with_source(names::ENTITY_SCREEN, 7);
        assert_eq!(manager.send_event(&event, text("s7")).await, 2);

        let generation =
            SignageEvent::new(names::GENERATION_COMPLETED).with_source(names::ENTITY_GENERATION, 7);
        assert_eq!(manager.send_event(&generation, text("g7")).await, 1);

        assert!(matches!(admin.try_recv(), Ok(Message::Text(t)) if t.as_str() == "s7"));
        assert!(matches!(admin.try_recv(), Ok(Message::Text(t)) if t.as_str() == "g7"));
        assert!(matches!(player.try_recv(), Ok(Message::Text(t)) if t.as_str() == "s7"));
        assert!(player.try_recv().is_err());
        assert!(other.try_recv().is_err());
    }

    #[tokio::test]
    async fn shutdown_sends_close_and_clears() {
        let manager = WsManager::new();
        let mut rx = manager.add("a".into(), None).await;
        manager.shutdown_all().await;
        assert!(matches!(rx.try_recv(), Ok(Message::Close(None))));
        assert_eq!(manager.connection_count().await, 0);
    }
}
