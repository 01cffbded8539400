//! Config Entries coordinator
//!
//! Wires flow handlers to the entry registry. Integrations register a
//! factory per domain; the coordinator starts flows through a
//! [`FlowManager`] and turns terminal `CreateEntry` results into registry
//! mutations:
//!
//! - user/import config flows create a new [`ConfigEntry`]
//! - options flows replace the target entry's options wholesale
//! - reauth flows update the entry themselves and finish with an abort, so
//!   the coordinator creates nothing for them

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use hestia_flow::{FlowContext, FlowHandler, FlowManager, FlowResponse, FlowResult, FlowSource, UserInput};

use crate::entry::ConfigEntry;
use crate::registry::{ConfigEntriesError, ConfigEntriesResult, EntryRegistry};

/// Factory producing a config flow handler for a domain
pub type ConfigFlowFactory = Arc<dyn Fn(&FlowContext) -> Box<dyn FlowHandler> + Send + Sync>;

/// Factory producing an options flow handler for an existing entry
pub type OptionsFlowFactory = Arc<dyn Fn(&ConfigEntry) -> Box<dyn FlowHandler> + Send + Sync>;

/// Result of driving a flow step through the coordinator
#[derive(Debug)]
pub struct FlowOutcome {
    pub response: FlowResponse,
    /// Entry created or updated by a terminal result, if any
    pub entry: Option<ConfigEntry>,
}

/// Coordinates config and options flows against the entry registry
pub struct ConfigEntries {
    registry: Arc<EntryRegistry>,

    /// Active config flows (user / import / reauth)
    flows: FlowManager,

    /// Active options flows
    options_flows: FlowManager,

    flow_factories: DashMap<String, ConfigFlowFactory>,
    options_factories: DashMap<String, OptionsFlowFactory>,
}

impl ConfigEntries {
    pub fn new(registry: Arc<EntryRegistry>) -> Self {
        Self {
            registry,
            flows: FlowManager::new(),
            options_flows: FlowManager::new(),
            flow_factories: DashMap::new(),
            options_factories: DashMap::new(),
        }
    }

    /// The registry this coordinator writes to
    pub fn registry(&self) -> &Arc<EntryRegistry> {
        &self.registry
    }

    /// Register a config flow factory for a domain
    pub fn register_flow(&self, domain: &str, factory: ConfigFlowFactory) {
        self.flow_factories.insert(domain.to_string(), factory);
        debug!("Registered config flow for domain: {}", domain);
    }

    /// Register an options flow factory for a domain
    pub fn register_options_flow(&self, domain: &str, factory: OptionsFlowFactory) {
        self.options_factories.insert(domain.to_string(), factory);
        debug!("Registered options flow for domain: {}", domain);
    }

    /// Start a config flow for a domain
    pub async fn flow_init(
        &self,
        domain: &str,
        context: FlowContext,
        input: Option<UserInput>,
    ) -> ConfigEntriesResult<FlowOutcome> {
        let factory = self
            .flow_factories
            .get(domain)
            .ok_or_else(|| ConfigEntriesError::NoFlowHandler(domain.to_string()))?
            .clone();

        let handler = factory(&context);
        let response = self.flows.init(domain, handler, context, input).await?;
        self.finish_config_flow(response)
    }

    /// Continue a config flow with user input
    pub async fn flow_configure(
        &self,
        flow_id: &str,
        input: Option<UserInput>,
    ) -> ConfigEntriesResult<FlowOutcome> {
        let response = self.flows.configure(flow_id, input).await?;
        self.finish_config_flow(response)
    }

    /// Start a reauth flow for an existing entry, seeded with its data
    pub async fn start_reauth_flow(&self, entry_id: &str) -> ConfigEntriesResult<FlowOutcome> {
        let entry = self
            .registry
            .get(entry_id)
            .ok_or_else(|| ConfigEntriesError::NotFound(entry_id.to_string()))?;

        let context = FlowContext::reauth(entry_id);
        self.flow_init(&entry.domain, context, Some(entry.data))
            .await
    }

    /// Start an options flow for an existing entry
    pub async fn options_init(&self, entry_id: &str) -> ConfigEntriesResult<FlowOutcome> {
        let entry = self
            .registry
            .get(entry_id)
            .ok_or_else(|| ConfigEntriesError::NotFound(entry_id.to_string()))?;

        let factory = self
            .options_factories
            .get(&entry.domain)
            .ok_or_else(|| ConfigEntriesError::NoFlowHandler(entry.domain.clone()))?
            .clone();

        let handler = factory(&entry);
        let context = FlowContext::options(entry_id);
        let response = self
            .options_flows
            .init_step(&entry.domain, handler, context, "init", None)
            .await?;
        self.finish_options_flow(response)
    }

    /// Continue an options flow with user input
    pub async fn options_configure(
        &self,
        flow_id: &str,
        input: Option<UserInput>,
    ) -> ConfigEntriesResult<FlowOutcome> {
        let response = self.options_flows.configure(flow_id, input).await?;
        self.finish_options_flow(response)
    }

    /// Apply a terminal config flow result to the registry
    fn finish_config_flow(&self, response: FlowResponse) -> ConfigEntriesResult<FlowOutcome> {
        // Reauth flows update their entry themselves and end in an abort.
        if response.context.source == FlowSource::Reauth {
            return Ok(FlowOutcome {
                response,
                entry: None,
            });
        }

        let entry = match &response.result {
            FlowResult::CreateEntry {
                title,
                data,
                unique_id,
            } => {
                let mut entry = ConfigEntry::new(&response.handler, title)
                    .with_data(data.clone())
                    .with_source(response.context.source.into());
                if let Some(unique_id) = unique_id {
                    entry = entry.with_unique_id(unique_id);
                }
                Some(self.registry.add(entry)?)
            }
            _ => None,
        };

        Ok(FlowOutcome { response, entry })
    }

    /// Apply a terminal options flow result to the registry
    fn finish_options_flow(&self, response: FlowResponse) -> ConfigEntriesResult<FlowOutcome> {
        let entry = match (&response.result, &response.context.entry_id) {
            (FlowResult::CreateEntry { data, .. }, Some(entry_id)) => {
                Some(self.registry.update_options(entry_id, data.clone())?)
            }
            _ => None,
        };

        Ok(FlowOutcome { response, entry })
    }
}
