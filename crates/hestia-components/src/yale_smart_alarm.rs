//! Yale Smart Alarm integration
//!
//! Config flow (interactive and YAML import), reauth flow, and an options
//! flow for the lock code settings. Credentials are checked through the
//! injected [`AlarmAuthenticator`]; the vendor client itself stays
//! external.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

use hestia_config_entries::{
    ConfigEntry, ConfigFlowFactory, EntryLookup, EntryRegistry, OptionsFlowFactory,
};
use hestia_flow::{
    FlowContext, FlowError, FlowHandler, FlowResult, FormField, UserInput,
    ABORT_ALREADY_CONFIGURED, ABORT_REAUTH_SUCCESSFUL,
};

pub const DOMAIN: &str = "yale_smart_alarm";

pub const CONF_USERNAME: &str = "username";
pub const CONF_PASSWORD: &str = "password";
pub const CONF_NAME: &str = "name";
pub const CONF_AREA_ID: &str = "area_id";
pub const CONF_CODE: &str = "code";
pub const CONF_LOCK_CODE_DIGITS: &str = "lock_code_digits";

pub const DEFAULT_NAME: &str = "Yale Smart Alarm";
pub const DEFAULT_AREA_ID: &str = "1";
pub const DEFAULT_LOCK_CODE_DIGITS: u64 = 6;

const ERROR_INVALID_AUTH: &str = "invalid_auth";
const ERROR_CODE_FORMAT_MISMATCH: &str = "code_format_mismatch";

/// Authentication failure against the alarm panel account
#[derive(Debug, Error)]
#[error("Invalid credentials")]
pub struct AuthError;

/// Credential check against the vendor account
#[async_trait]
pub trait AlarmAuthenticator: Send + Sync {
    async fn authenticate(&self, username: &str, password: &str) -> Result<(), AuthError>;
}

/// Wizard steps
enum Step {
    User,
    Import,
    Reauth,
    ReauthConfirm,
}

impl Step {
    fn from_id(step_id: &str) -> Option<Self> {
        match step_id {
            "user" => Some(Step::User),
            "import" => Some(Step::Import),
            "reauth" => Some(Step::Reauth),
            "reauth_confirm" => Some(Step::ReauthConfirm),
            _ => None,
        }
    }
}

fn user_schema() -> Vec<FormField> {
    vec![
        FormField::required(CONF_USERNAME),
        FormField::required(CONF_PASSWORD),
        FormField::optional(CONF_NAME, json!(DEFAULT_NAME)),
        FormField::optional(CONF_AREA_ID, json!(DEFAULT_AREA_ID)),
    ]
}

fn reauth_schema() -> Vec<FormField> {
    vec![
        FormField::required(CONF_USERNAME),
        FormField::required(CONF_PASSWORD),
    ]
}

fn coerce_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn string_field(input: &UserInput, key: &str) -> Result<String, FlowError> {
    input
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| FlowError::InvalidInput(format!("missing or non-string field: {key}")))
}

/// Config flow for the Yale Smart Alarm integration
pub struct YaleConfigFlow {
    registry: Arc<EntryRegistry>,
    authenticator: Arc<dyn AlarmAuthenticator>,
    /// Entry being re-authenticated, for reauth flows
    reauth_entry_id: Option<String>,
}

impl YaleConfigFlow {
    pub fn new(
        registry: Arc<EntryRegistry>,
        authenticator: Arc<dyn AlarmAuthenticator>,
        reauth_entry_id: Option<String>,
    ) -> Self {
        Self {
            registry,
            authenticator,
            reauth_entry_id,
        }
    }

    async fn step_user(&self, input: Option<UserInput>) -> Result<FlowResult, FlowError> {
        let input = match input {
            None => return Ok(FlowResult::form("user", user_schema())),
            Some(input) => input,
        };

        let username = string_field(&input, CONF_USERNAME)?;
        let password = string_field(&input, CONF_PASSWORD)?;

        if self
            .authenticator
            .authenticate(&username, &password)
            .await
            .is_err()
        {
            debug!(username = %username, "Authentication failed");
            return Ok(FlowResult::form_with_errors(
                "user",
                user_schema(),
                ERROR_INVALID_AUTH,
            ));
        }

        // The account is the unique id; one entry per account.
        if self.registry.by_unique_id(DOMAIN, &username).is_some() {
            return Ok(FlowResult::abort(ABORT_ALREADY_CONFIGURED));
        }

        let name = input
            .get(CONF_NAME)
            .cloned()
            .unwrap_or_else(|| json!(DEFAULT_NAME));
        let area_id = input
            .get(CONF_AREA_ID)
            .cloned()
            .unwrap_or_else(|| json!(DEFAULT_AREA_ID));

        let mut data = HashMap::new();
        data.insert(CONF_USERNAME.to_string(), json!(username));
        data.insert(CONF_PASSWORD.to_string(), json!(password));
        data.insert(CONF_NAME.to_string(), name);
        data.insert(CONF_AREA_ID.to_string(), area_id);

        Ok(FlowResult::create_entry(&username, data, Some(username.clone())))
    }

    async fn step_reauth_confirm(&self, input: Option<UserInput>) -> Result<FlowResult, FlowError> {
        let input = match input {
            None => return Ok(FlowResult::form("reauth_confirm", reauth_schema())),
            Some(input) => input,
        };

        let username = string_field(&input, CONF_USERNAME)?;
        let password = string_field(&input, CONF_PASSWORD)?;

        if self
            .authenticator
            .authenticate(&username, &password)
            .await
            .is_err()
        {
            return Ok(FlowResult::form_with_errors(
                "reauth_confirm",
                reauth_schema(),
                ERROR_INVALID_AUTH,
            ));
        }

        let entry_id = self
            .reauth_entry_id
            .as_deref()
            .ok_or_else(|| FlowError::InvalidInput("reauth flow without entry".to_string()))?;
        let entry = self
            .registry
            .get(entry_id)
            .ok_or_else(|| FlowError::InvalidInput(format!("unknown entry: {entry_id}")))?;

        // Merge the new credentials over the stored data; everything else
        // stays untouched.
        let mut data = entry.data;
        data.insert(CONF_USERNAME.to_string(), json!(username));
        data.insert(CONF_PASSWORD.to_string(), json!(password));
        self.registry
            .update_data(entry_id, data)
            .map_err(|e| FlowError::InvalidInput(e.to_string()))?;

        Ok(FlowResult::abort(ABORT_REAUTH_SUCCESSFUL))
    }
}

#[async_trait]
impl FlowHandler for YaleConfigFlow {
    async fn handle_step(
        &mut self,
        step_id: &str,
        input: Option<UserInput>,
    ) -> Result<FlowResult, FlowError> {
        match Step::from_id(step_id) {
            Some(Step::User) => self.step_user(input).await,
            // Import replays the user step so YAML and interactive setup
            // converge on identical entry data.
            Some(Step::Import) => self.step_user(input).await,
            Some(Step::Reauth) => Ok(FlowResult::form("reauth_confirm", reauth_schema())),
            Some(Step::ReauthConfirm) => self.step_reauth_confirm(input).await,
            None => Err(FlowError::UnknownStep(step_id.to_string())),
        }
    }
}

/// Options flow editing the lock code settings
pub struct YaleOptionsFlow {
    /// Snapshot of the entry's current options
    options: HashMap<String, Value>,
}

impl YaleOptionsFlow {
    pub fn new(entry: &ConfigEntry) -> Self {
        Self {
            options: entry.options.clone(),
        }
    }

    fn init_schema(&self) -> Vec<FormField> {
        let code = self.options.get(CONF_CODE).cloned().unwrap_or(json!(""));
        let digits = self
            .options
            .get(CONF_LOCK_CODE_DIGITS)
            .cloned()
            .unwrap_or(json!(DEFAULT_LOCK_CODE_DIGITS));
        vec![
            FormField::optional(CONF_CODE, code),
            FormField::optional(CONF_LOCK_CODE_DIGITS, digits),
        ]
    }

    fn step_init(&self, input: Option<UserInput>) -> FlowResult {
        let input = match input {
            None => return FlowResult::form("init", self.init_schema()),
            Some(input) => input,
        };

        let code = input.get(CONF_CODE).and_then(Value::as_str).unwrap_or("");
        let digits = input
            .get(CONF_LOCK_CODE_DIGITS)
            .and_then(coerce_u64)
            .unwrap_or(DEFAULT_LOCK_CODE_DIGITS);

        if !code.is_empty() && code.chars().count() as u64 != digits {
            debug!(expected = digits, got = code.chars().count(), "Lock code length mismatch");
            return FlowResult::form_with_errors(
                "init",
                self.init_schema(),
                ERROR_CODE_FORMAT_MISMATCH,
            );
        }

        FlowResult::create_entry("", input, None)
    }
}

#[async_trait]
impl FlowHandler for YaleOptionsFlow {
    async fn handle_step(
        &mut self,
        step_id: &str,
        input: Option<UserInput>,
    ) -> Result<FlowResult, FlowError> {
        match step_id {
            "init" => Ok(self.step_init(input)),
            other => Err(FlowError::UnknownStep(other.to_string())),
        }
    }
}

/// Factory for registering the config flow with the coordinator
pub fn config_flow_factory(
    registry: Arc<EntryRegistry>,
    authenticator: Arc<dyn AlarmAuthenticator>,
) -> ConfigFlowFactory {
    Arc::new(move |context: &FlowContext| -> Box<dyn FlowHandler> {
        Box::new(YaleConfigFlow::new(
            registry.clone(),
            authenticator.clone(),
            context.entry_id.clone(),
        ))
    })
}

/// Factory for registering the options flow with the coordinator
pub fn options_flow_factory() -> OptionsFlowFactory {
    Arc::new(|entry: &ConfigEntry| -> Box<dyn FlowHandler> { Box::new(YaleOptionsFlow::new(entry)) })
}
