use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};
use tracing::debug;
use uuid::Uuid;

use lantern_types::events::GatewayEvent;
use lantern_types::models::Message;

/// Sender half of one connection's outbox. The connection's writer task
/// drains the receiver end and owns the socket sink, so fan-out never
/// blocks on a slow socket.
pub type Outbox = mpsc::UnboundedSender<GatewayEvent>;

/// Maps each channel to its current subscribers and delivers events.
///
/// The registry is the single owner of subscription state: connections
/// enter through `join` and leave through the `remove_connection`
/// disconnect hook. There is no protocol-level leave.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    /// channel_id -> (connection_id -> outbox)
    channels: RwLock<HashMap<String, HashMap<Uuid, Outbox>>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(DispatcherInner {
                channels: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Register a connection as a subscriber of a channel. A connection may
    /// subscribe to any number of channels.
    pub async fn join(&self, channel_id: &str, conn_id: Uuid, outbox: Outbox) {
        self.inner
            .channels
            .write()
            .await
            .entry(channel_id.to_string())
            .or_default()
            .insert(conn_id, outbox);
    }

    /// Disconnect lifecycle hook: drop the connection from every channel it
    /// subscribed to. Channels left without subscribers are pruned from the
    /// registry (their logs are unaffected).
    pub async fn remove_connection(&self, conn_id: Uuid) {
        let mut channels = self.inner.channels.write().await;
        channels.retain(|_, subscribers| {
            subscribers.remove(&conn_id);
            !subscribers.is_empty()
        });
    }

    /// Deliver a freshly persisted message to every subscriber of the
    /// channel, the originating connection included: receipt of the
    /// broadcast is the sender's durability confirmation.
    pub async fn broadcast_new(&self, channel_id: &str, message: Message) {
        self.broadcast(
            channel_id,
            GatewayEvent::NewMessage {
                channel_id: channel_id.to_string(),
                message,
            },
        )
        .await;
    }

    /// Deliver a mutated record (reaction or recall result) to every
    /// subscriber of the channel.
    pub async fn broadcast_update(&self, channel_id: &str, message: Message) {
        self.broadcast(
            channel_id,
            GatewayEvent::UpdateMessage {
                channel_id: channel_id.to_string(),
                message,
            },
        )
        .await;
    }

    async fn broadcast(&self, channel_id: &str, event: GatewayEvent) {
        let mut channels = self.inner.channels.write().await;
        let Some(subscribers) = channels.get_mut(channel_id) else {
            return;
        };
        debug!(
            channel_id,
            subscribers = subscribers.len(),
            "broadcasting event"
        );
        // A closed outbox means the connection is gone; prune it here.
        subscribers.retain(|_, outbox| outbox.send(event.clone()).is_ok());
    }

    /// Current subscriber connection ids for a channel (diagnostics only).
    pub async fn subscribers(&self, channel_id: &str) -> Vec<Uuid> {
        self.inner
            .channels
            .read()
            .await
            .get(channel_id)
            .map(|subscribers| subscribers.keys().copied().collect())
            .unwrap_or_default()
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}
