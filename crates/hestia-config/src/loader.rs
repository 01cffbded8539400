//! YAML configuration loader
//!
//! Parses the top-level configuration mapping and answers the two questions
//! integrations ask of it: "what is the section for my domain" and "which
//! platform entries under a domain belong to me".

use serde_yaml::Value;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};

/// A parsed legacy configuration document
pub struct Configuration {
    root: serde_yaml::Mapping,
}

impl Configuration {
    /// Parse a configuration document from a string
    pub fn from_str(content: &str) -> ConfigResult<Self> {
        let value: Value = serde_yaml::from_str(content)?;
        match value {
            Value::Mapping(root) => Ok(Self { root }),
            Value::Null => Ok(Self {
                root: serde_yaml::Mapping::new(),
            }),
            _ => Err(ConfigError::NotAMapping),
        }
    }

    /// Load a configuration document from a file
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        debug!("Loading configuration file: {:?}", path);
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_str(&content)
    }

    /// Raw section for a domain key, if present
    pub fn section(&self, domain: &str) -> Option<&Value> {
        self.root.get(domain)
    }

    /// Platform-style entries under a domain
    ///
    /// A domain section holding a list yields its elements; a bare mapping
    /// is treated as a single-element list.
    pub fn platforms(&self, domain: &str) -> Vec<&Value> {
        match self.section(domain) {
            Some(Value::Sequence(seq)) => seq.iter().collect(),
            Some(value @ Value::Mapping(_)) => vec![value],
            _ => Vec::new(),
        }
    }

    /// Platform entries for a domain filtered by their `platform` key
    pub fn platform_sections(&self, domain: &str, platform: &str) -> Vec<&Value> {
        self.platforms(domain)
            .into_iter()
            .filter(|value| {
                value
                    .get("platform")
                    .and_then(Value::as_str)
                    .map(|p| p == platform)
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Domain keys present in the document
    pub fn domains(&self) -> Vec<String> {
        self.root
            .keys()
            .filter_map(|k| k.as_str().map(str::to_string))
            .collect()
    }
}

/// Convert a YAML value to JSON so legacy sections can flow through the
/// same `UserInput`-typed paths as interactive input
pub fn to_json_value(value: &Value) -> ConfigResult<serde_json::Value> {
    Ok(match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                serde_json::Value::from(i)
            } else if let Some(u) = n.as_u64() {
                serde_json::Value::from(u)
            } else {
                serde_json::Value::from(n.as_f64().unwrap_or_default())
            }
        }
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Sequence(seq) => {
            let items: ConfigResult<Vec<_>> = seq.iter().map(to_json_value).collect();
            serde_json::Value::Array(items?)
        }
        Value::Mapping(map) => {
            let mut object = serde_json::Map::with_capacity(map.len());
            for (k, v) in map {
                let key = k
                    .as_str()
                    .ok_or_else(|| ConfigError::UnsupportedKey(format!("{:?}", k)))?;
                object.insert(key.to_string(), to_json_value(v)?);
            }
            serde_json::Value::Object(object)
        }
        Value::Tagged(tagged) => to_json_value(&tagged.value)?,
    })
}
