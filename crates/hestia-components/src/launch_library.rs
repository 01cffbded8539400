//! Launch Library integration
//!
//! Single-step registration wizard for the launch tracking service. Only
//! one instance may be configured; a second attempt aborts with
//! `single_instance_allowed`. Legacy YAML import extracts the recognized
//! `name` key and replays the interactive path, so both converge on
//! identical entry data.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use hestia_config_entries::{ConfigFlowFactory, EntryLookup};
use hestia_flow::{
    FlowContext, FlowError, FlowHandler, FlowResult, FormField, UserInput,
    ABORT_SINGLE_INSTANCE_ALLOWED,
};

pub const DOMAIN: &str = "launch_library";
pub const DEFAULT_NAME: &str = "Launch Library";
pub const CONF_NAME: &str = "name";

/// Wizard steps
enum Step {
    User,
    Import,
}

impl Step {
    fn from_id(step_id: &str) -> Option<Self> {
        match step_id {
            "user" => Some(Step::User),
            "import" => Some(Step::Import),
            _ => None,
        }
    }
}

/// Config flow for the Launch Library integration
pub struct LaunchLibraryConfigFlow {
    lookup: Arc<dyn EntryLookup>,
}

impl LaunchLibraryConfigFlow {
    pub fn new(lookup: Arc<dyn EntryLookup>) -> Self {
        Self { lookup }
    }

    fn step_user(&self, input: Option<UserInput>) -> FlowResult {
        if self.lookup.has_entries(DOMAIN) {
            return FlowResult::abort(ABORT_SINGLE_INSTANCE_ALLOWED);
        }

        match input {
            None => FlowResult::form(
                "user",
                vec![FormField::optional(CONF_NAME, json!(DEFAULT_NAME))],
            ),
            // Entry data is the submitted input verbatim.
            Some(data) => FlowResult::create_entry(DEFAULT_NAME, data, None),
        }
    }

    fn step_import(&self, legacy: Option<UserInput>) -> FlowResult {
        let legacy = legacy.unwrap_or_default();
        let name = legacy
            .get(CONF_NAME)
            .cloned()
            .unwrap_or_else(|| json!(DEFAULT_NAME));

        let mut input = UserInput::new();
        input.insert(CONF_NAME.to_string(), name);
        self.step_user(Some(input))
    }
}

#[async_trait]
impl FlowHandler for LaunchLibraryConfigFlow {
    async fn handle_step(
        &mut self,
        step_id: &str,
        input: Option<UserInput>,
    ) -> Result<FlowResult, FlowError> {
        match Step::from_id(step_id) {
            Some(Step::User) => Ok(self.step_user(input)),
            Some(Step::Import) => Ok(self.step_import(input)),
            None => Err(FlowError::UnknownStep(step_id.to_string())),
        }
    }
}

/// Factory for registering the flow with the config entries coordinator
pub fn config_flow_factory(lookup: Arc<dyn EntryLookup>) -> ConfigFlowFactory {
    Arc::new(move |_context: &FlowContext| -> Box<dyn FlowHandler> {
        Box::new(LaunchLibraryConfigFlow::new(lookup.clone()))
    })
}
