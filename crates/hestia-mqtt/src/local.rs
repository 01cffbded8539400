//! In-process message bus
//!
//! Delivers published messages synchronously to every matching
//! subscription. Serves embedded use and as the test stand-in for a real
//! broker.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

use crate::message::{Message, MessageBus, MessageHandler, MqttResult, QoS};
use crate::topic;

struct Subscription {
    filter: String,
    qos: QoS,
    handler: MessageHandler,
}

/// In-process bus with wildcard-aware topic matching
pub struct LocalBus {
    subscriptions: DashMap<u64, Subscription>,
    next_id: AtomicU64,
}

impl LocalBus {
    pub fn new() -> Self {
        Self {
            subscriptions: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Deliver a message to every subscription whose filter matches
    pub fn publish(&self, topic: &str, payload: impl Into<Vec<u8>>) {
        let payload = payload.into();
        for sub in self.subscriptions.iter() {
            if topic::matches(&sub.filter, topic) {
                trace!(topic = %topic, filter = %sub.filter, "Delivering message");
                (sub.handler)(Message {
                    topic: topic.to_string(),
                    payload: payload.clone(),
                    qos: sub.qos,
                    retain: false,
                });
            }
        }
    }

    /// Number of open subscriptions
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }
}

impl Default for LocalBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageBus for LocalBus {
    async fn subscribe(
        &self,
        topic_filter: &str,
        qos: QoS,
        handler: MessageHandler,
    ) -> MqttResult<()> {
        topic::validate_filter(topic_filter)?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.subscriptions.insert(
            id,
            Subscription {
                filter: topic_filter.to_string(),
                qos,
                handler,
            },
        );
        Ok(())
    }
}
