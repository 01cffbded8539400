//! Topic filter validation and matching
//!
//! Implements the MQTT 3.1.1 filter rules: `+` matches exactly one level,
//! `#` matches the remaining levels and must be the last character of the
//! filter.

use crate::message::{MqttError, MqttResult};

/// Validate a subscription topic filter
pub fn validate_filter(filter: &str) -> MqttResult<()> {
    if filter.is_empty() {
        return Err(MqttError::InvalidFilter("filter is empty".to_string()));
    }
    if filter.contains('\0') {
        return Err(MqttError::InvalidFilter(format!(
            "filter contains NUL: {filter:?}"
        )));
    }

    let levels: Vec<&str> = filter.split('/').collect();
    for (i, level) in levels.iter().enumerate() {
        if *level == "#" {
            if i != levels.len() - 1 {
                return Err(MqttError::InvalidFilter(format!(
                    "'#' must be the last level: {filter}"
                )));
            }
        } else if level.contains('#') || (level.contains('+') && *level != "+") {
            return Err(MqttError::InvalidFilter(format!(
                "wildcard must occupy a whole level: {filter}"
            )));
        }
    }

    Ok(())
}

/// Check whether a concrete topic matches a filter
///
/// The filter is assumed valid; call [`validate_filter`] first for
/// untrusted input.
pub fn matches(filter: &str, topic: &str) -> bool {
    let mut filter_levels = filter.split('/');
    let mut topic_levels = topic.split('/');

    loop {
        match (filter_levels.next(), topic_levels.next()) {
            (Some("#"), _) => return true,
            (Some("+"), Some(_)) => continue,
            (Some(f), Some(t)) if f == t => continue,
            (None, None) => return true,
            _ => return false,
        }
    }
}
