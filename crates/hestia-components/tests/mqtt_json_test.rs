//! MQTT JSON device tracker platform over the in-process bus

mod common;

use std::sync::Arc;

use common::{capturing_sink, settle, wait_for_updates};
use hestia_components::mqtt_json::{setup_from_config, setup_scanner, MqttJsonConfig, MqttJsonError};
use hestia_mqtt::{LocalBus, QoS};

fn config(devices: &[(&str, &str)], qos: QoS) -> MqttJsonConfig {
    MqttJsonConfig {
        devices: devices
            .iter()
            .map(|(dev_id, topic)| (dev_id.to_string(), topic.to_string()))
            .collect(),
        qos,
    }
}

#[tokio::test]
async fn test_minimal_payload_dispatches_update() {
    let bus = Arc::new(LocalBus::new());
    let (dispatcher, seen) = capturing_sink();

    setup_scanner(
        bus.clone(),
        config(&[("id1", "location/id1")], QoS::AtMostOnce),
        dispatcher,
    )
    .await
    .unwrap();

    bus.publish("location/id1", br#"{"latitude": 1.0, "longitude": 2.0}"#.to_vec());
    wait_for_updates(&seen, 1).await;

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].dev_id, "id1");
    assert_eq!(seen[0].gps, (1.0, 2.0));
    assert!(seen[0].gps_accuracy.is_none());
    assert!(seen[0].battery.is_none());
}

#[tokio::test]
async fn test_full_payload_carries_accuracy_and_battery() {
    let bus = Arc::new(LocalBus::new());
    let (dispatcher, seen) = capturing_sink();

    setup_scanner(
        bus.clone(),
        config(&[("zanzito", "location/zanzito")], QoS::AtMostOnce),
        dispatcher,
    )
    .await
    .unwrap();

    bus.publish(
        "location/zanzito",
        br#"{"latitude": 46.2, "longitude": 6.1, "gps_accuracy": 60, "battery_level": 99.6, "speed": 12}"#
            .to_vec(),
    );
    wait_for_updates(&seen, 1).await;

    let seen = seen.lock().unwrap();
    assert_eq!(seen[0].gps, (46.2, 6.1));
    assert_eq!(seen[0].gps_accuracy, Some(60));
    assert_eq!(seen[0].battery.as_deref(), Some("99.6"));
}

#[tokio::test]
async fn test_invalid_payloads_dispatch_nothing() {
    let bus = Arc::new(LocalBus::new());
    let (dispatcher, seen) = capturing_sink();

    setup_scanner(
        bus.clone(),
        config(&[("id1", "location/id1")], QoS::AtMostOnce),
        dispatcher,
    )
    .await
    .unwrap();

    // Not JSON at all.
    bus.publish("location/id1", b"not json".to_vec());
    // JSON but missing latitude.
    bus.publish("location/id1", br#"{"longitude": 2.0}"#.to_vec());
    // Latitude of the wrong shape.
    bus.publish(
        "location/id1",
        br#"{"latitude": [1.0], "longitude": 2.0}"#.to_vec(),
    );
    settle().await;
    assert!(seen.lock().unwrap().is_empty());

    // The subscription survives bad payloads.
    bus.publish("location/id1", br#"{"latitude": 1.0, "longitude": 2.0}"#.to_vec());
    wait_for_updates(&seen, 1).await;
}

#[tokio::test]
async fn test_each_device_gets_its_own_topic() {
    let bus = Arc::new(LocalBus::new());
    let (dispatcher, seen) = capturing_sink();

    setup_scanner(
        bus.clone(),
        config(
            &[("a", "location/a"), ("b", "location/b")],
            QoS::AtLeastOnce,
        ),
        dispatcher,
    )
    .await
    .unwrap();
    assert_eq!(bus.subscription_count(), 2);

    bus.publish("location/b", br#"{"latitude": 3.0, "longitude": 4.0}"#.to_vec());
    wait_for_updates(&seen, 1).await;

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].dev_id, "b");
}

#[tokio::test]
async fn test_invalid_topic_fails_setup() {
    let bus = Arc::new(LocalBus::new());
    let (dispatcher, _seen) = capturing_sink();

    let result = setup_scanner(
        bus,
        config(&[("id1", "bad/#/topic")], QoS::AtMostOnce),
        dispatcher,
    )
    .await;

    assert!(matches!(result, Err(MqttJsonError::Mqtt(_))));
}

#[tokio::test]
async fn test_setup_from_legacy_yaml_section() {
    let bus = Arc::new(LocalBus::new());
    let (dispatcher, seen) = capturing_sink();

    let config = hestia_config::Configuration::from_str(
        r#"
device_tracker:
  - platform: mqtt_json
    qos: 1
    devices:
      pixel: location/pixel
"#,
    )
    .unwrap();
    let sections = config.platform_sections("device_tracker", "mqtt_json");
    assert_eq!(sections.len(), 1);

    setup_from_config(bus.clone(), sections[0], dispatcher)
        .await
        .unwrap();

    bus.publish("location/pixel", br#"{"latitude": 1.5, "longitude": 2.5}"#.to_vec());
    wait_for_updates(&seen, 1).await;
    assert_eq!(seen.lock().unwrap()[0].dev_id, "pixel");
}
