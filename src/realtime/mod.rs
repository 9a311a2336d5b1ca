//! Realtime broadcast — fan-out of chat and tool-call events to subscribers.
//!
//! Delivery is best-effort and fire-and-forget: the engine only guarantees
//! delivery to currently-live subscribers. There is no replay or queued
//! backlog; reconnection and backoff are a transport-layer concern. A slow or
//! dead subscriber never stalls delivery to the others.

use crate::chat::Message;
use crate::tools::ToolCall;
use crate::types::SubscriberId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};
use tokio::time::MissedTickBehavior;

// =============================================================================
// Envelope
// =============================================================================

/// Tagged realtime frame pushed to every subscriber.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Envelope {
    Message { message: Message },
    #[serde(rename_all = "camelCase")]
    ToolCall { tool_call: ToolCall },
    Connection { status: String },
}

impl Envelope {
    pub fn message(message: Message) -> Self {
        Self::Message { message }
    }

    pub fn tool_call(tool_call: ToolCall) -> Self {
        Self::ToolCall { tool_call }
    }

    /// The greeting frame delivered to each new subscription.
    pub fn connected() -> Self {
        Self::Connection {
            status: "connected".to_string(),
        }
    }
}

// =============================================================================
// Subscriptions
// =============================================================================

/// Receipt for an open subscription, used to unsubscribe.
#[derive(Debug, Clone)]
pub struct Subscription {
    pub id: SubscriberId,
}

/// Counters about broadcast usage.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct BroadcastStats {
    /// Envelopes accepted for publishing.
    pub published: u64,
    /// Per-subscriber sends that hit a closed channel.
    pub dropped: u64,
}

// =============================================================================
// Broadcaster
// =============================================================================

/// In-memory fan-out of envelopes to all open subscriptions.
///
/// Sends are unbounded and non-blocking; a closed channel is skipped during a
/// publish and the subscriber is removed lazily (or by the heartbeat sweep).
#[derive(Debug)]
pub struct Broadcaster {
    subscribers: Arc<RwLock<HashMap<SubscriberId, mpsc::UnboundedSender<Envelope>>>>,
    stats: Arc<RwLock<BroadcastStats>>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self {
            subscribers: Arc::new(RwLock::new(HashMap::new())),
            stats: Arc::new(RwLock::new(BroadcastStats::default())),
        }
    }

    /// Open a subscription. The `connection/connected` envelope is delivered
    /// first, before any published event.
    pub async fn subscribe(&self) -> (Subscription, mpsc::UnboundedReceiver<Envelope>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = SubscriberId::new();

        let _ = tx.send(Envelope::connected());
        self.subscribers.write().await.insert(id.clone(), tx);

        tracing::debug!(subscriber = %id, "subscriber connected");
        (Subscription { id }, rx)
    }

    /// Close a subscription.
    pub async fn unsubscribe(&self, subscription: &Subscription) {
        self.subscribers.write().await.remove(&subscription.id);
        tracing::debug!(subscriber = %subscription.id, "subscriber disconnected");
    }

    /// Publish a chat message to all live subscribers. Returns how many
    /// received it.
    pub async fn publish_message(&self, message: Message) -> usize {
        self.publish(Envelope::message(message)).await
    }

    /// Publish a tool-call event to all live subscribers. Returns how many
    /// received it.
    pub async fn publish_tool_call(&self, tool_call: ToolCall) -> usize {
        self.publish(Envelope::tool_call(tool_call)).await
    }

    async fn publish(&self, envelope: Envelope) -> usize {
        let mut dead = Vec::new();
        let delivered = {
            let subscribers = self.subscribers.read().await;
            let mut delivered = 0;
            for (id, tx) in subscribers.iter() {
                // Fire-and-forget; a closed channel means the subscriber is
                // gone and gets cleaned up below.
                if tx.send(envelope.clone()).is_ok() {
                    delivered += 1;
                } else {
                    dead.push(id.clone());
                }
            }
            delivered
        };

        if !dead.is_empty() {
            let mut subscribers = self.subscribers.write().await;
            for id in &dead {
                subscribers.remove(id);
            }
        }

        let mut stats = self.stats.write().await;
        stats.published += 1;
        stats.dropped += dead.len() as u64;

        tracing::debug!(delivered, dropped = dead.len(), "published envelope");
        delivered
    }

    /// Spawn the liveness sweep: each tick, subscribers whose receiving side
    /// is gone are removed from the fan-out set. The caller owns the returned
    /// handle and aborts it on shutdown.
    pub fn spawn_heartbeat(&self, interval: Duration) -> tokio::task::JoinHandle<()> {
        let subscribers = Arc::clone(&self.subscribers);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let mut subs = subscribers.write().await;
                let before = subs.len();
                subs.retain(|_, tx| !tx.is_closed());
                let removed = before - subs.len();
                if removed > 0 {
                    tracing::debug!(removed, "heartbeat removed dead subscribers");
                }
            }
        })
    }

    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.read().await.len()
    }

    pub async fn stats(&self) -> BroadcastStats {
        self.stats.read().await.clone()
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ChatRole;
    use crate::tools::ToolCall;
    use serde_json::Map;

    fn sample_message() -> Message {
        Message::user("hello")
    }

    #[tokio::test]
    async fn subscriber_greeted_with_connected() {
        let broadcaster = Broadcaster::new();
        let (_sub, mut rx) = broadcaster.subscribe().await;

        let first = rx.recv().await.unwrap();
        assert!(matches!(first, Envelope::Connection { status } if status == "connected"));
    }

    #[tokio::test]
    async fn fan_out_reaches_all_subscribers() {
        let broadcaster = Broadcaster::new();
        let (_s1, mut rx1) = broadcaster.subscribe().await;
        let (_s2, mut rx2) = broadcaster.subscribe().await;

        // Drain greetings.
        rx1.recv().await.unwrap();
        rx2.recv().await.unwrap();

        let delivered = broadcaster.publish_message(sample_message()).await;
        assert_eq!(delivered, 2);

        for rx in [&mut rx1, &mut rx2] {
            let envelope = rx.recv().await.unwrap();
            match envelope {
                Envelope::Message { message } => {
                    assert_eq!(message.role, ChatRole::User);
                    assert_eq!(message.content, "hello");
                }
                other => panic!("expected message envelope, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn dead_subscriber_does_not_stall_delivery() {
        let broadcaster = Broadcaster::new();
        let (_s1, mut rx1) = broadcaster.subscribe().await;
        let (_s2, rx2) = broadcaster.subscribe().await;
        let (_s3, mut rx3) = broadcaster.subscribe().await;

        rx1.recv().await.unwrap();
        rx3.recv().await.unwrap();
        drop(rx2);

        let delivered = broadcaster.publish_message(sample_message()).await;
        assert_eq!(delivered, 2);
        assert!(matches!(rx1.recv().await, Some(Envelope::Message { .. })));
        assert!(matches!(rx3.recv().await, Some(Envelope::Message { .. })));

        // The closed channel was swept out during the publish.
        assert_eq!(broadcaster.subscriber_count().await, 2);
        let stats = broadcaster.stats().await;
        assert_eq!(stats.published, 1);
        assert_eq!(stats.dropped, 1);
    }

    #[tokio::test]
    async fn unsubscribe_stops_delivery() {
        let broadcaster = Broadcaster::new();
        let (sub, mut rx) = broadcaster.subscribe().await;
        rx.recv().await.unwrap();

        broadcaster.unsubscribe(&sub).await;
        assert_eq!(broadcaster.subscriber_count().await, 0);

        let delivered = broadcaster.publish_message(sample_message()).await;
        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn heartbeat_sweeps_closed_subscriptions() {
        let broadcaster = Broadcaster::new();
        let (_s1, rx1) = broadcaster.subscribe().await;
        let (_s2, _rx2) = broadcaster.subscribe().await;
        drop(rx1);

        let handle = broadcaster.spawn_heartbeat(Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(broadcaster.subscriber_count().await, 1);

        handle.abort();
    }

    #[test]
    fn envelope_wire_shapes() {
        let json = serde_json::to_value(Envelope::connected()).unwrap();
        assert_eq!(json["type"], "connection");
        assert_eq!(json["status"], "connected");

        let json = serde_json::to_value(Envelope::message(sample_message())).unwrap();
        assert_eq!(json["type"], "message");
        assert_eq!(json["message"]["content"], "hello");

        let call = ToolCall::pending("fileSystem", Map::new());
        let json = serde_json::to_value(Envelope::tool_call(call)).unwrap();
        assert_eq!(json["type"], "toolCall");
        assert_eq!(json["toolCall"]["name"], "fileSystem");
        assert_eq!(json["toolCall"]["status"], "pending");
    }
}
