//! rumqttc-backed bus implementation
//!
//! Owns a subscription table and an event-loop pump task. Incoming
//! publishes are dispatched to every subscription whose filter matches.
//! Broker sessions are not assumed persistent: every ConnAck re-issues the
//! known subscriptions.

use async_trait::async_trait;
use dashmap::DashMap;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::message::{Message, MessageBus, MessageHandler, MqttResult, QoS};
use crate::topic;

/// Delay before polling again after an event-loop error
const RECONNECT_DELAY: Duration = Duration::from_secs(1);
/// Capacity of the client's request channel
const CLIENT_CHANNEL_CAPACITY: usize = 100;

struct Subscription {
    filter: String,
    qos: QoS,
    handler: MessageHandler,
}

/// MQTT broker connection implementing [`MessageBus`]
pub struct MqttConnection {
    client: AsyncClient,
    subscriptions: Arc<DashMap<u64, Subscription>>,
    next_id: AtomicU64,
}

impl MqttConnection {
    /// Connect to a broker and spawn the event-loop pump
    ///
    /// The pump runs until the returned handle is aborted; connection
    /// errors are logged and polling continues.
    pub fn new(options: MqttOptions) -> (Self, JoinHandle<()>) {
        let (client, eventloop) = AsyncClient::new(options, CLIENT_CHANNEL_CAPACITY);
        let subscriptions: Arc<DashMap<u64, Subscription>> = Arc::new(DashMap::new());

        let pump_client = client.clone();
        let pump_subscriptions = subscriptions.clone();
        let handle = tokio::spawn(async move {
            pump(eventloop, pump_client, pump_subscriptions).await;
        });

        (
            Self {
                client,
                subscriptions,
                next_id: AtomicU64::new(1),
            },
            handle,
        )
    }

    fn to_client_qos(qos: QoS) -> rumqttc::QoS {
        match qos {
            QoS::AtMostOnce => rumqttc::QoS::AtMostOnce,
            QoS::AtLeastOnce => rumqttc::QoS::AtLeastOnce,
            QoS::ExactlyOnce => rumqttc::QoS::ExactlyOnce,
        }
    }
}

#[async_trait]
impl MessageBus for MqttConnection {
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

        self.client
            .subscribe(topic_filter, Self::to_client_qos(qos))
            .await?;

        debug!(filter = %topic_filter, qos = u8::from(qos), "Subscribed");
        Ok(())
    }
}

/// Poll the event loop, dispatching publishes to matching handlers
async fn pump(
    mut eventloop: EventLoop,
    client: AsyncClient,
    subscriptions: Arc<DashMap<u64, Subscription>>,
) {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                let qos = QoS::try_from(publish.qos as u8).unwrap_or_default();
                for sub in subscriptions.iter() {
                    if topic::matches(&sub.filter, &publish.topic) {
                        (sub.handler)(Message {
                            topic: publish.topic.clone(),
                            payload: publish.payload.to_vec(),
                            qos,
                            retain: publish.retain,
                        });
                    }
                }
            }
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                info!("Connected to MQTT broker");
                // The broker may have dropped our session; subscribe again.
                // Snapshot the filters so no map guard is held across await.
                let filters: Vec<(String, QoS)> = subscriptions
                    .iter()
                    .map(|sub| (sub.filter.clone(), sub.qos))
                    .collect();
                for (filter, qos) in filters {
                    if let Err(e) = client
                        .subscribe(&filter, MqttConnection::to_client_qos(qos))
                        .await
                    {
                        warn!(filter = %filter, error = %e, "Failed to re-subscribe");
                    }
                }
            }
            Ok(_) => {}
            Err(e) => {
                error!(error = %e, "MQTT event loop error, retrying");
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        }
    }
}
