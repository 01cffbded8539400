//! Flow handler trait and context
//!
//! Integrations implement [`FlowHandler`] once per wizard. The handler owns
//! its step dispatch: it matches on the step id (typically via a private
//! step enum) and returns [`FlowError::UnknownStep`] for ids it does not
//! define.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::manager::FlowError;
use crate::result::FlowResult;

/// User-submitted form data
pub type UserInput = HashMap<String, serde_json::Value>;

/// How a flow was started
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FlowSource {
    /// Started interactively by the user
    #[default]
    User,
    /// Replayed from legacy YAML configuration
    Import,
    /// Triggered because stored credentials were found invalid
    Reauth,
}

impl FlowSource {
    /// Step id the manager runs first for this source
    pub fn initial_step_id(&self) -> &'static str {
        match self {
            FlowSource::User => "user",
            FlowSource::Import => "import",
            FlowSource::Reauth => "reauth",
        }
    }
}

/// Context a flow is started with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowContext {
    pub source: FlowSource,
    /// Entry being operated on, for reauth and options flows
    pub entry_id: Option<String>,
}

impl FlowContext {
    pub fn new(source: FlowSource) -> Self {
        Self {
            source,
            entry_id: None,
        }
    }

    /// Context for re-authenticating an existing entry
    pub fn reauth(entry_id: impl Into<String>) -> Self {
        Self {
            source: FlowSource::Reauth,
            entry_id: Some(entry_id.into()),
        }
    }

    /// Context for editing an existing entry's options
    pub fn options(entry_id: impl Into<String>) -> Self {
        Self {
            source: FlowSource::User,
            entry_id: Some(entry_id.into()),
        }
    }
}

/// Trait implemented by each integration's wizard
#[async_trait]
pub trait FlowHandler: Send {
    /// Run one step of the flow
    ///
    /// `input` is `None` when the step should show its form and `Some` when
    /// the user submitted data for it.
    async fn handle_step(
        &mut self,
        step_id: &str,
        input: Option<UserInput>,
    ) -> Result<FlowResult, FlowError>;
}
