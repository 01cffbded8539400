//! Built-in integrations
//!
//! Each module is one integration: its domain constant, config keys, flow
//! handlers, and (for platforms) setup functions.
//!
//! - [`launch_library`] - single-instance registration wizard
//! - [`yale_smart_alarm`] - alarm panel wizard with reauth and options flows
//! - [`mqtt_json`] - device tracker platform ingesting JSON positions over MQTT

pub mod launch_library;
pub mod mqtt_json;
pub mod yale_smart_alarm;
