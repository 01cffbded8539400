//! Data-entry flow engine
//!
//! This crate provides the wizard machinery that drives short interactive
//! configuration sequences ("flows"). A flow is a linear form-filling
//! exchange: the handler shows a form, the user submits input, and the flow
//! either shows another form, creates an entry, or aborts.
//!
//! # Key Types
//!
//! - [`FlowHandler`] - Trait implemented by each integration's wizard
//! - [`FlowResult`] - Tagged result of a step (form / create_entry / abort)
//! - [`FlowManager`] - Tracks active flows and dispatches steps to handlers
//!
//! Handlers dispatch on their own step enum; the manager never interprets
//! integration-specific error codes, it only moves results through.

pub mod handler;
pub mod manager;
pub mod result;

pub use handler::{FlowContext, FlowHandler, FlowSource, UserInput};
pub use manager::{FlowError, FlowManager, FlowProgress, FlowResponse};
pub use result::{
    FlowResult, FormField, ABORT_ALREADY_CONFIGURED, ABORT_REAUTH_SUCCESSFUL,
    ABORT_SINGLE_INSTANCE_ALLOWED, ERROR_BASE,
};
