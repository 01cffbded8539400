#![allow(dead_code)]

//! Shared integration test harness
//!
//! Wires a registry-backed [`ConfigEntries`] coordinator with all built-in
//! flows registered, a switchable stub authenticator, and a capturing
//! location sink.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use hestia_components::{launch_library, yale_smart_alarm};
use hestia_components::yale_smart_alarm::{AlarmAuthenticator, AuthError};
use hestia_config_entries::{ConfigEntries, EntryRegistry};
use hestia_device_tracker::{LocationUpdate, SeeDispatcher, SeeFn, DEFAULT_DISPATCH_CAPACITY};

/// Authenticator whose verdict can be flipped mid-test
pub struct StubAuthenticator {
    valid: AtomicBool,
}

impl StubAuthenticator {
    pub fn new(valid: bool) -> Self {
        Self {
            valid: AtomicBool::new(valid),
        }
    }

    pub fn set_valid(&self, valid: bool) {
        self.valid.store(valid, Ordering::SeqCst);
    }
}

#[async_trait]
impl AlarmAuthenticator for StubAuthenticator {
    async fn authenticate(&self, _username: &str, _password: &str) -> Result<(), AuthError> {
        if self.valid.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(AuthError)
        }
    }
}

/// Coordinator plus the collaborators tests assert against
pub struct TestHub {
    pub registry: Arc<EntryRegistry>,
    pub entries: ConfigEntries,
    pub auth: Arc<StubAuthenticator>,
}

impl TestHub {
    pub fn new() -> Self {
        let registry = Arc::new(EntryRegistry::new());
        let auth = Arc::new(StubAuthenticator::new(true));

        let entries = ConfigEntries::new(registry.clone());
        entries.register_flow(
            launch_library::DOMAIN,
            launch_library::config_flow_factory(registry.clone()),
        );
        entries.register_flow(
            yale_smart_alarm::DOMAIN,
            yale_smart_alarm::config_flow_factory(registry.clone(), auth.clone()),
        );
        entries.register_options_flow(
            yale_smart_alarm::DOMAIN,
            yale_smart_alarm::options_flow_factory(),
        );

        Self {
            registry,
            entries,
            auth,
        }
    }
}

/// A location sink that records every update it receives
pub fn capturing_sink() -> (SeeDispatcher, Arc<Mutex<Vec<LocationUpdate>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = seen.clone();
    let see: SeeFn = Arc::new(move |update| {
        let seen = seen_clone.clone();
        Box::pin(async move {
            seen.lock().unwrap().push(update);
        })
    });
    let (dispatcher, _handle) = SeeDispatcher::spawn(see, DEFAULT_DISPATCH_CAPACITY);
    (dispatcher, seen)
}

/// Wait until the sink has received `len` updates
pub async fn wait_for_updates(seen: &Arc<Mutex<Vec<LocationUpdate>>>, len: usize) {
    for _ in 0..50 {
        if seen.lock().unwrap().len() >= len {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("sink never received {len} updates");
}

/// Give in-flight dispatches a chance to land (or prove they never will)
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(30)).await;
}
