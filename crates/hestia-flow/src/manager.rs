//! Flow Manager
//!
//! Tracks active flows and dispatches steps to their handlers. A flow is
//! stored only while its latest result is a form; terminal results
//! (create_entry, abort) remove it. `configure` removes the flow from the
//! table before running the step and re-inserts it afterwards, so a flow is
//! never reentrant: a concurrent `configure` for the same id observes
//! [`FlowError::UnknownFlow`].

use dashmap::DashMap;
use thiserror::Error;
use tracing::{debug, info};

use crate::handler::{FlowContext, FlowHandler, UserInput};
use crate::result::FlowResult;

/// Flow errors
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("Flow not found: {0}")]
    UnknownFlow(String),

    #[error("Unknown step: {0}")]
    UnknownStep(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// A flow waiting for its next form submission
struct ActiveFlow {
    domain: String,
    context: FlowContext,
    handler: Box<dyn FlowHandler>,
    current_step: String,
}

/// Result of running one step, with the flow's identity attached
#[derive(Debug)]
pub struct FlowResponse {
    pub flow_id: String,
    /// Integration domain handling the flow
    pub handler: String,
    pub context: FlowContext,
    pub result: FlowResult,
}

/// Summary of an in-progress flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowProgress {
    pub flow_id: String,
    pub handler: String,
    pub step_id: String,
}

/// Manager for active flows
pub struct FlowManager {
    flows: DashMap<String, ActiveFlow>,
}

impl FlowManager {
    pub fn new() -> Self {
        Self {
            flows: DashMap::new(),
        }
    }

    /// Start a flow at the initial step of its context's source
    pub async fn init(
        &self,
        domain: &str,
        handler: Box<dyn FlowHandler>,
        context: FlowContext,
        input: Option<UserInput>,
    ) -> Result<FlowResponse, FlowError> {
        let step_id = context.source.initial_step_id().to_string();
        self.init_step(domain, handler, context, &step_id, input).await
    }

    /// Start a flow at an explicit step (used by options flows, which always
    /// begin at `init` regardless of source)
    pub async fn init_step(
        &self,
        domain: &str,
        mut handler: Box<dyn FlowHandler>,
        context: FlowContext,
        step_id: &str,
        input: Option<UserInput>,
    ) -> Result<FlowResponse, FlowError> {
        let result = handler.handle_step(step_id, input).await?;
        let flow_id = ulid::Ulid::new().to_string();

        if let FlowResult::Form { step_id: next, .. } = &result {
            debug!(
                flow_id = %flow_id,
                domain = %domain,
                step = %next,
                "Flow waiting for input"
            );
            self.flows.insert(
                flow_id.clone(),
                ActiveFlow {
                    domain: domain.to_string(),
                    context: context.clone(),
                    handler,
                    current_step: next.clone(),
                },
            );
        }

        Ok(FlowResponse {
            flow_id,
            handler: domain.to_string(),
            context,
            result,
        })
    }

    /// Continue a flow with user input for its current step
    ///
    /// If the handler returns an error the flow is dropped; the caller has
    /// to start over.
    pub async fn configure(
        &self,
        flow_id: &str,
        input: Option<UserInput>,
    ) -> Result<FlowResponse, FlowError> {
        let (_, mut flow) = self
            .flows
            .remove(flow_id)
            .ok_or_else(|| FlowError::UnknownFlow(flow_id.to_string()))?;

        let step_id = flow.current_step.clone();
        let result = flow.handler.handle_step(&step_id, input).await?;

        let domain = flow.domain.clone();
        let context = flow.context.clone();

        if let FlowResult::Form { step_id: next, .. } = &result {
            flow.current_step = next.clone();
            self.flows.insert(flow_id.to_string(), flow);
        } else {
            debug!(flow_id = %flow_id, domain = %domain, "Flow finished");
        }

        Ok(FlowResponse {
            flow_id: flow_id.to_string(),
            handler: domain,
            context,
            result,
        })
    }

    /// List flows waiting for input
    pub fn in_progress(&self) -> Vec<FlowProgress> {
        self.flows
            .iter()
            .map(|r| FlowProgress {
                flow_id: r.key().clone(),
                handler: r.value().domain.clone(),
                step_id: r.value().current_step.clone(),
            })
            .collect()
    }

    /// Drop an unfinished flow
    pub fn abort(&self, flow_id: &str) -> Result<(), FlowError> {
        let (_, flow) = self
            .flows
            .remove(flow_id)
            .ok_or_else(|| FlowError::UnknownFlow(flow_id.to_string()))?;
        info!(flow_id = %flow_id, domain = %flow.domain, "Aborted flow");
        Ok(())
    }

    /// Number of flows waiting for input
    pub fn len(&self) -> usize {
        self.flows.len()
    }

    /// Check if no flows are in progress
    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }
}

impl Default for FlowManager {
    fn default() -> Self {
        Self::new()
    }
}
