//! MQTT JSON device tracker platform
//!
//! Subscribes to one topic per device and ingests flat JSON position
//! payloads:
//!
//! ```json
//! {"latitude": 46.2, "longitude": 6.1, "gps_accuracy": 60, "battery_level": 99.6}
//! ```
//!
//! `latitude` and `longitude` are required and must coerce to float;
//! `gps_accuracy` (int) and `battery_level` (string-coerced) are optional.
//! Extra keys are ignored. A payload that is not JSON, or that fails the
//! schema, is logged and dropped; the two cases log differently but are
//! otherwise handled identically. Valid reports are handed to the
//! [`SeeDispatcher`] fire-and-forget.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use hestia_device_tracker::{LocationUpdate, SeeDispatcher};
use hestia_mqtt::{Message, MessageBus, MessageHandler, MqttError, QoS};

pub const DOMAIN: &str = "mqtt_json";

/// Platform setup errors
#[derive(Debug, Error)]
pub enum MqttJsonError {
    #[error("MQTT error: {0}")]
    Mqtt(#[from] MqttError),

    #[error("Invalid platform configuration: {0}")]
    InvalidConfig(#[from] serde_yaml::Error),
}

/// Platform configuration: one topic per tracked device
///
/// The binding is immutable for the adapter's lifetime; there is no
/// unsubscribe path.
#[derive(Debug, Clone, Deserialize)]
pub struct MqttJsonConfig {
    /// Device identifier -> subscription topic
    pub devices: HashMap<String, String>,

    /// QoS forwarded unchanged to every subscription
    #[serde(default)]
    pub qos: QoS,
}

/// Subscribe to every configured device topic
pub async fn setup_scanner(
    bus: Arc<dyn MessageBus>,
    config: MqttJsonConfig,
    dispatcher: SeeDispatcher,
) -> Result<(), MqttJsonError> {
    for (dev_id, topic) in config.devices {
        let handler = message_handler(dev_id.clone(), dispatcher.clone());
        bus.subscribe(&topic, config.qos, handler).await?;
        debug!(dev_id = %dev_id, topic = %topic, "Tracking device");
    }
    Ok(())
}

/// Set up the platform from a legacy YAML platform section
pub async fn setup_from_config(
    bus: Arc<dyn MessageBus>,
    section: &serde_yaml::Value,
    dispatcher: SeeDispatcher,
) -> Result<(), MqttJsonError> {
    let config: MqttJsonConfig = serde_yaml::from_value(section.clone())?;
    setup_scanner(bus, config, dispatcher).await
}

/// Per-device message callback: parse, validate, dispatch
fn message_handler(dev_id: String, dispatcher: SeeDispatcher) -> MessageHandler {
    Arc::new(move |message: Message| {
        let payload: Value = match serde_json::from_slice(&message.payload) {
            Ok(payload) => payload,
            Err(e) => {
                error!(
                    dev_id = %dev_id,
                    error = %e,
                    "Error parsing JSON payload: {}",
                    String::from_utf8_lossy(&message.payload)
                );
                return;
            }
        };

        let update = match parse_report(&dev_id, &payload) {
            Ok(update) => update,
            Err(reason) => {
                error!(
                    dev_id = %dev_id,
                    "Skipping update for following data because of missing or malformatted data: {}",
                    reason
                );
                return;
            }
        };

        // Fire-and-forget; a full channel just drops this report.
        dispatcher.dispatch(update);
    })
}

/// Validate the fixed schema and build the normalized update
fn parse_report(dev_id: &str, payload: &Value) -> Result<LocationUpdate, String> {
    let latitude = coerce_f64(payload.get("latitude"))
        .ok_or_else(|| format!("latitude missing or not a float: {payload}"))?;
    let longitude = coerce_f64(payload.get("longitude"))
        .ok_or_else(|| format!("longitude missing or not a float: {payload}"))?;

    let mut update = LocationUpdate::new(dev_id, latitude, longitude);

    if let Some(value) = payload.get("gps_accuracy") {
        let accuracy =
            coerce_i64(Some(value)).ok_or_else(|| format!("gps_accuracy not an int: {value}"))?;
        update = update.with_gps_accuracy(accuracy);
    }

    if let Some(value) = payload.get("battery_level") {
        update = update.with_battery(coerce_string(value));
    }

    Ok(update)
}

fn coerce_f64(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn coerce_i64(value: Option<&Value>) -> Option<i64> {
    match value? {
        // Floats truncate toward zero, matching int() semantics.
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn coerce_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
