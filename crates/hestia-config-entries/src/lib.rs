//! Config Entries
//!
//! This crate provides the configuration entry system. Config entries
//! represent individual integration instances; they are created by config
//! flows, re-authenticated by reauth flows, and edited by options flows.
//!
//! # Key Types
//!
//! - [`ConfigEntry`] - A single integration configuration
//! - [`EntryRegistry`] - Thread-safe in-memory store of entries
//! - [`EntryLookup`] - Read-only query interface injected into flows
//! - [`ConfigEntries`] - Coordinator wiring flows to the registry
//!
//! Persistence is the host's concern; nothing here touches disk.

pub mod coordinator;
pub mod entry;
pub mod registry;

pub use coordinator::{ConfigEntries, ConfigFlowFactory, FlowOutcome, OptionsFlowFactory};
pub use entry::{ConfigEntry, ConfigEntrySource};
pub use registry::{ConfigEntriesError, ConfigEntriesResult, EntryLookup, EntryRegistry};
