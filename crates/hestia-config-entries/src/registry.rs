//! Entry Registry
//!
//! In-memory, thread-safe store of config entries. Persistence is the
//! host's concern; the registry never touches disk.
//!
//! Flows that only need to answer "is this integration already set up" or
//! "is this unique id taken" depend on the read-only [`EntryLookup`] trait
//! rather than the registry itself.

use std::collections::HashSet;

use chrono::Utc;
use dashmap::DashMap;
use thiserror::Error;
use tracing::{debug, info};

use crate::entry::ConfigEntry;

/// Config entries errors
#[derive(Debug, Error)]
pub enum ConfigEntriesError {
    #[error("Entry not found: {0}")]
    NotFound(String),

    #[error("Entry already exists for domain {domain} with unique_id {unique_id}")]
    AlreadyExists { domain: String, unique_id: String },

    #[error("No flow handler registered for domain: {0}")]
    NoFlowHandler(String),

    #[error("Flow error: {0}")]
    Flow(#[from] hestia_flow::FlowError),
}

pub type ConfigEntriesResult<T> = Result<T, ConfigEntriesError>;

/// Read-only query interface over configured entries
///
/// Injected into config flows for single-instance and unique-id checks.
pub trait EntryLookup: Send + Sync {
    /// All entries for a domain
    fn entries_for(&self, domain: &str) -> Vec<ConfigEntry>;

    /// Entry with the given unique id within a domain
    fn by_unique_id(&self, domain: &str, unique_id: &str) -> Option<ConfigEntry>;

    /// Whether any entry exists for a domain
    fn has_entries(&self, domain: &str) -> bool {
        !self.entries_for(domain).is_empty()
    }
}

/// In-memory store of config entries
pub struct EntryRegistry {
    /// Primary index: entry_id -> ConfigEntry
    entries: DashMap<String, ConfigEntry>,

    /// Index: domain -> set of entry_ids
    by_domain: DashMap<String, HashSet<String>>,

    /// Index: (domain, unique_id) -> entry_id
    by_unique_id: DashMap<(String, String), String>,
}

impl EntryRegistry {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            by_domain: DashMap::new(),
            by_unique_id: DashMap::new(),
        }
    }

    /// Index an entry
    fn index_entry(&self, entry: &ConfigEntry) {
        let entry_id = entry.entry_id.clone();

        self.entries.insert(entry_id.clone(), entry.clone());

        self.by_domain
            .entry(entry.domain.clone())
            .or_default()
            .insert(entry_id.clone());

        if let Some(ref unique_id) = entry.unique_id {
            self.by_unique_id
                .insert((entry.domain.clone(), unique_id.clone()), entry_id);
        }
    }

    /// Remove an entry from indexes
    fn unindex_entry(&self, entry: &ConfigEntry) {
        if let Some(mut ids) = self.by_domain.get_mut(&entry.domain) {
            ids.remove(&entry.entry_id);
        }

        if let Some(ref unique_id) = entry.unique_id {
            self.by_unique_id
                .remove(&(entry.domain.clone(), unique_id.clone()));
        }

        self.entries.remove(&entry.entry_id);
    }

    /// Get an entry by ID
    pub fn get(&self, entry_id: &str) -> Option<ConfigEntry> {
        self.entries.get(entry_id).map(|r| r.value().clone())
    }

    /// Add a new config entry
    pub fn add(&self, entry: ConfigEntry) -> ConfigEntriesResult<ConfigEntry> {
        if let Some(ref unique_id) = entry.unique_id {
            if self.by_unique_id(&entry.domain, unique_id).is_some() {
                return Err(ConfigEntriesError::AlreadyExists {
                    domain: entry.domain.clone(),
                    unique_id: unique_id.clone(),
                });
            }
        }

        self.index_entry(&entry);

        info!(
            "Added config entry: {} ({}) [{}]",
            entry.title, entry.domain, entry.entry_id
        );

        Ok(entry)
    }

    /// Replace an entry's data
    pub fn update_data(
        &self,
        entry_id: &str,
        data: std::collections::HashMap<String, serde_json::Value>,
    ) -> ConfigEntriesResult<ConfigEntry> {
        self.update_with(entry_id, |entry| entry.data = data)
    }

    /// Replace an entry's options wholesale
    pub fn update_options(
        &self,
        entry_id: &str,
        options: std::collections::HashMap<String, serde_json::Value>,
    ) -> ConfigEntriesResult<ConfigEntry> {
        self.update_with(entry_id, |entry| entry.options = options)
    }

    /// Change an entry's title
    pub fn update_title(&self, entry_id: &str, title: &str) -> ConfigEntriesResult<ConfigEntry> {
        let title = title.to_string();
        self.update_with(entry_id, move |entry| entry.title = title)
    }

    fn update_with(
        &self,
        entry_id: &str,
        apply: impl FnOnce(&mut ConfigEntry),
    ) -> ConfigEntriesResult<ConfigEntry> {
        let entry = self
            .get(entry_id)
            .ok_or_else(|| ConfigEntriesError::NotFound(entry_id.to_string()))?;

        self.unindex_entry(&entry);

        let mut updated = entry;
        apply(&mut updated);
        updated.modified_at = Utc::now();

        self.index_entry(&updated);
        debug!("Updated config entry: {}", entry_id);
        Ok(updated)
    }

    /// Remove an entry
    pub fn remove(&self, entry_id: &str) -> ConfigEntriesResult<ConfigEntry> {
        let entry = self
            .get(entry_id)
            .ok_or_else(|| ConfigEntriesError::NotFound(entry_id.to_string()))?;

        self.unindex_entry(&entry);

        info!(
            "Removed config entry: {} ({}) [{}]",
            entry.title, entry.domain, entry_id
        );

        Ok(entry)
    }

    /// Iterate over all entries
    pub fn iter(&self) -> impl Iterator<Item = ConfigEntry> + '_ {
        self.entries.iter().map(|r| r.value().clone())
    }

    /// Get count of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for EntryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EntryLookup for EntryRegistry {
    fn entries_for(&self, domain: &str) -> Vec<ConfigEntry> {
        self.by_domain
            .get(domain)
            .map(|ids| ids.iter().filter_map(|id| self.get(id)).collect())
            .unwrap_or_default()
    }

    fn by_unique_id(&self, domain: &str, unique_id: &str) -> Option<ConfigEntry> {
        self.by_unique_id
            .get(&(domain.to_string(), unique_id.to_string()))
            .and_then(|entry_id| self.get(&entry_id))
    }
}
