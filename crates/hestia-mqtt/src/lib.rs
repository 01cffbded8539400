//! Messaging boundary
//!
//! Everything that talks to an MQTT-shaped broker goes through the
//! [`MessageBus`] trait: integrations subscribe with a topic filter, a QoS
//! level passed through unchanged, and a non-blocking per-message handler.
//!
//! Two implementations are provided:
//!
//! - [`LocalBus`] - in-process bus for embedded use and tests
//! - [`MqttConnection`] - rumqttc-backed client for a real broker
//!
//! The broker itself stays external; this crate owns no delivery guarantees
//! beyond forwarding the requested QoS.

mod connection;
mod local;
mod message;
pub mod topic;

pub use connection::MqttConnection;
pub use local::LocalBus;
pub use message::{InvalidQoS, Message, MessageBus, MessageHandler, MqttError, MqttResult, QoS};
