//! Message, QoS, and the bus trait

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Invalid numeric QoS level
#[derive(Debug, Error)]
#[error("Invalid QoS level {0}, must be 0-2")]
pub struct InvalidQoS(pub u8);

/// MQTT messaging errors
#[derive(Debug, Error)]
pub enum MqttError {
    #[error("Invalid topic filter: {0}")]
    InvalidFilter(String),

    #[error("MQTT client error: {0}")]
    Client(#[from] rumqttc::ClientError),
}

pub type MqttResult<T> = Result<T, MqttError>;

/// Messaging delivery guarantee level, forwarded unchanged to subscriptions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum QoS {
    #[default]
    AtMostOnce,
    AtLeastOnce,
    ExactlyOnce,
}

impl TryFrom<u8> for QoS {
    type Error = InvalidQoS;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        match level {
            0 => Ok(QoS::AtMostOnce),
            1 => Ok(QoS::AtLeastOnce),
            2 => Ok(QoS::ExactlyOnce),
            other => Err(InvalidQoS(other)),
        }
    }
}

impl From<QoS> for u8 {
    fn from(qos: QoS) -> u8 {
        match qos {
            QoS::AtMostOnce => 0,
            QoS::AtLeastOnce => 1,
            QoS::ExactlyOnce => 2,
        }
    }
}

/// A received message
#[derive(Debug, Clone)]
pub struct Message {
    pub topic: String,
    pub payload: Vec<u8>,
    pub qos: QoS,
    pub retain: bool,
}

impl Message {
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            qos: QoS::AtMostOnce,
            retain: false,
        }
    }
}

/// Non-blocking per-message callback
pub type MessageHandler = Arc<dyn Fn(Message) + Send + Sync>;

/// Subscribe-only view of a message broker
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Open a subscription for a topic filter
    ///
    /// The handler is invoked once per received message matching the
    /// filter. Handlers for different subscriptions may run concurrently;
    /// ordering is only inherited from the underlying transport.
    async fn subscribe(
        &self,
        topic_filter: &str,
        qos: QoS,
        handler: MessageHandler,
    ) -> MqttResult<()>;
}
