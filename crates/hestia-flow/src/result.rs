//! Flow step results
//!
//! Every step of a flow resolves to one of three tagged variants: show a
//! form, create an entry, or abort. Handlers build these through the
//! convenience constructors; the manager and any frontend consume them.

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// Error key used for form-wide errors (as opposed to per-field errors)
pub const ERROR_BASE: &str = "base";

/// Abort reason: the integration allows only one configured instance
pub const ABORT_SINGLE_INSTANCE_ALLOWED: &str = "single_instance_allowed";
/// Abort reason: an entry with the same unique id already exists
pub const ABORT_ALREADY_CONFIGURED: &str = "already_configured";
/// Abort reason: a reauthentication flow finished successfully
pub const ABORT_REAUTH_SUCCESSFUL: &str = "reauth_successful";

/// One field of a form schema
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FormField {
    pub name: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl FormField {
    /// A required field with no default
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: true,
            default: None,
        }
    }

    /// An optional field seeded with a default value
    pub fn optional(name: impl Into<String>, default: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            required: false,
            default: Some(default.into()),
        }
    }
}

/// Result of a single flow step
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FlowResult {
    /// Show a form for the given step, optionally with errors from the
    /// previous submission
    Form {
        step_id: String,
        data_schema: Vec<FormField>,
        errors: HashMap<String, String>,
    },
    /// Terminal: the flow finished and produced entry data
    CreateEntry {
        title: String,
        data: HashMap<String, Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        unique_id: Option<String>,
    },
    /// Terminal: the flow cannot continue
    Abort { reason: String },
}

impl FlowResult {
    /// Show a form with no errors
    pub fn form(step_id: impl Into<String>, data_schema: Vec<FormField>) -> Self {
        FlowResult::Form {
            step_id: step_id.into(),
            data_schema,
            errors: HashMap::new(),
        }
    }

    /// Re-show a form with an error under [`ERROR_BASE`]
    pub fn form_with_errors(
        step_id: impl Into<String>,
        data_schema: Vec<FormField>,
        error_code: impl Into<String>,
    ) -> Self {
        let mut errors = HashMap::new();
        errors.insert(ERROR_BASE.to_string(), error_code.into());
        FlowResult::Form {
            step_id: step_id.into(),
            data_schema,
            errors,
        }
    }

    /// Finish the flow with entry data
    pub fn create_entry(
        title: impl Into<String>,
        data: HashMap<String, Value>,
        unique_id: Option<String>,
    ) -> Self {
        FlowResult::CreateEntry {
            title: title.into(),
            data,
            unique_id,
        }
    }

    /// Abort the flow with a machine-readable reason
    pub fn abort(reason: impl Into<String>) -> Self {
        FlowResult::Abort {
            reason: reason.into(),
        }
    }

    /// Whether this result ends the flow
    pub fn is_terminal(&self) -> bool {
        !matches!(self, FlowResult::Form { .. })
    }
}
