//! Legacy YAML configuration
//!
//! Loads a `configuration.yaml`-style document and exposes the pieces the
//! import paths need: per-domain sections, platform-style lists, and a
//! YAML-to-JSON conversion so legacy sections can replay through the same
//! submit path as interactive user input.

mod error;
mod loader;

pub use error::{ConfigError, ConfigResult};
pub use loader::{to_json_value, Configuration};
