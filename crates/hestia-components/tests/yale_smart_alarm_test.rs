//! Yale Smart Alarm config, reauth, and options flows driven through the
//! coordinator

mod common;

use common::TestHub;
use hestia_components::yale_smart_alarm::{
    CONF_AREA_ID, CONF_CODE, CONF_LOCK_CODE_DIGITS, CONF_NAME, CONF_PASSWORD, CONF_USERNAME,
    DEFAULT_AREA_ID, DEFAULT_NAME, DOMAIN,
};
use hestia_config_entries::ConfigEntry;
use hestia_flow::{
    FlowContext, FlowResult, FlowSource, UserInput, ABORT_ALREADY_CONFIGURED,
    ABORT_REAUTH_SUCCESSFUL, ERROR_BASE,
};
use serde_json::json;

fn credentials(username: &str, password: &str) -> UserInput {
    let mut input = UserInput::new();
    input.insert(CONF_USERNAME.to_string(), json!(username));
    input.insert(CONF_PASSWORD.to_string(), json!(password));
    input
}

fn full_input(username: &str, password: &str) -> UserInput {
    let mut input = credentials(username, password);
    input.insert(CONF_NAME.to_string(), json!(DEFAULT_NAME));
    input.insert(CONF_AREA_ID.to_string(), json!(DEFAULT_AREA_ID));
    input
}

async fn configure_entry(hub: &TestHub, input: UserInput) -> ConfigEntry {
    hub.entries
        .flow_init(DOMAIN, FlowContext::new(FlowSource::User), Some(input))
        .await
        .unwrap()
        .entry
        .expect("flow should create an entry")
}

#[tokio::test]
async fn test_user_flow_creates_entry_with_defaults() {
    let hub = TestHub::new();

    let entry = configure_entry(&hub, credentials("bob@example.com", "hunter2")).await;

    assert_eq!(entry.title, "bob@example.com");
    assert_eq!(entry.unique_id.as_deref(), Some("bob@example.com"));
    assert_eq!(entry.data[CONF_USERNAME], "bob@example.com");
    assert_eq!(entry.data[CONF_PASSWORD], "hunter2");
    assert_eq!(entry.data[CONF_NAME], DEFAULT_NAME);
    assert_eq!(entry.data[CONF_AREA_ID], DEFAULT_AREA_ID);
}

#[tokio::test]
async fn test_import_of_credentials_matches_interactive_entry() {
    let imported = TestHub::new();
    let outcome = imported
        .entries
        .flow_init(
            DOMAIN,
            FlowContext::new(FlowSource::Import),
            Some(credentials("bob@example.com", "hunter2")),
        )
        .await
        .unwrap();
    let imported_entry = outcome.entry.unwrap();

    let interactive = TestHub::new();
    let interactive_entry =
        configure_entry(&interactive, full_input("bob@example.com", "hunter2")).await;

    assert_eq!(imported_entry.data, interactive_entry.data);
    assert_eq!(imported_entry.title, interactive_entry.title);
    assert_eq!(imported_entry.unique_id, interactive_entry.unique_id);
}

#[tokio::test]
async fn test_invalid_auth_allows_retry() {
    let hub = TestHub::new();
    hub.auth.set_valid(false);

    let outcome = hub
        .entries
        .flow_init(DOMAIN, FlowContext::new(FlowSource::User), None)
        .await
        .unwrap();
    let flow_id = outcome.response.flow_id;

    let outcome = hub
        .entries
        .flow_configure(&flow_id, Some(credentials("bob@example.com", "wrong")))
        .await
        .unwrap();

    match &outcome.response.result {
        FlowResult::Form {
            step_id, errors, ..
        } => {
            assert_eq!(step_id, "user");
            assert_eq!(errors[ERROR_BASE], "invalid_auth");
        }
        other => panic!("expected form, got {:?}", other),
    }
    assert!(hub.registry.is_empty());

    // Same flow, corrected credentials.
    hub.auth.set_valid(true);
    let outcome = hub
        .entries
        .flow_configure(&flow_id, Some(credentials("bob@example.com", "hunter2")))
        .await
        .unwrap();
    assert!(outcome.entry.is_some());
}

#[tokio::test]
async fn test_duplicate_account_aborts() {
    let hub = TestHub::new();
    configure_entry(&hub, credentials("bob@example.com", "hunter2")).await;

    let outcome = hub
        .entries
        .flow_init(
            DOMAIN,
            FlowContext::new(FlowSource::User),
            Some(credentials("bob@example.com", "other-password")),
        )
        .await
        .unwrap();

    match outcome.response.result {
        FlowResult::Abort { reason } => assert_eq!(reason, ABORT_ALREADY_CONFIGURED),
        other => panic!("expected abort, got {:?}", other),
    }
    assert_eq!(hub.registry.len(), 1);
}

#[tokio::test]
async fn test_failed_reauth_leaves_entry_untouched() {
    let hub = TestHub::new();
    let entry = configure_entry(&hub, credentials("bob@example.com", "hunter2")).await;

    let outcome = hub.entries.start_reauth_flow(&entry.entry_id).await.unwrap();
    match &outcome.response.result {
        FlowResult::Form { step_id, .. } => assert_eq!(step_id, "reauth_confirm"),
        other => panic!("expected form, got {:?}", other),
    }

    hub.auth.set_valid(false);
    let outcome = hub
        .entries
        .flow_configure(
            &outcome.response.flow_id,
            Some(credentials("bob@example.com", "wrong")),
        )
        .await
        .unwrap();

    match &outcome.response.result {
        FlowResult::Form {
            step_id, errors, ..
        } => {
            assert_eq!(step_id, "reauth_confirm");
            assert_eq!(errors[ERROR_BASE], "invalid_auth");
        }
        other => panic!("expected form, got {:?}", other),
    }

    let stored = hub.registry.get(&entry.entry_id).unwrap();
    assert_eq!(stored.data, entry.data);
}

#[tokio::test]
async fn test_successful_reauth_updates_credentials_only() {
    let hub = TestHub::new();
    let entry = configure_entry(&hub, credentials("bob@example.com", "hunter2")).await;

    let outcome = hub.entries.start_reauth_flow(&entry.entry_id).await.unwrap();
    let outcome = hub
        .entries
        .flow_configure(
            &outcome.response.flow_id,
            Some(credentials("bob@example.com", "new-password")),
        )
        .await
        .unwrap();

    match outcome.response.result {
        FlowResult::Abort { reason } => assert_eq!(reason, ABORT_REAUTH_SUCCESSFUL),
        other => panic!("expected abort, got {:?}", other),
    }
    // Reauth never creates a second entry.
    assert!(outcome.entry.is_none());
    assert_eq!(hub.registry.len(), 1);

    let stored = hub.registry.get(&entry.entry_id).unwrap();
    assert_eq!(stored.data[CONF_PASSWORD], "new-password");
    assert_eq!(stored.data[CONF_USERNAME], "bob@example.com");
    assert_eq!(stored.data[CONF_NAME], DEFAULT_NAME);
    assert_eq!(stored.data[CONF_AREA_ID], DEFAULT_AREA_ID);
}

#[tokio::test]
async fn test_options_flow_rejects_then_accepts_code() {
    let hub = TestHub::new();
    let entry = configure_entry(&hub, credentials("bob@example.com", "hunter2")).await;

    let outcome = hub.entries.options_init(&entry.entry_id).await.unwrap();
    match &outcome.response.result {
        FlowResult::Form { step_id, .. } => assert_eq!(step_id, "init"),
        other => panic!("expected form, got {:?}", other),
    }
    let flow_id = outcome.response.flow_id;

    let mut input = UserInput::new();
    input.insert(CONF_CODE.to_string(), json!("123"));
    input.insert(CONF_LOCK_CODE_DIGITS.to_string(), json!(6));

    let outcome = hub
        .entries
        .options_configure(&flow_id, Some(input))
        .await
        .unwrap();
    match &outcome.response.result {
        FlowResult::Form {
            step_id, errors, ..
        } => {
            assert_eq!(step_id, "init");
            assert_eq!(errors[ERROR_BASE], "code_format_mismatch");
        }
        other => panic!("expected form, got {:?}", other),
    }
    assert!(hub
        .registry
        .get(&entry.entry_id)
        .unwrap()
        .options
        .is_empty());

    let mut input = UserInput::new();
    input.insert(CONF_CODE.to_string(), json!("123456"));
    input.insert(CONF_LOCK_CODE_DIGITS.to_string(), json!(6));

    let outcome = hub
        .entries
        .options_configure(&flow_id, Some(input.clone()))
        .await
        .unwrap();
    assert!(matches!(
        outcome.response.result,
        FlowResult::CreateEntry { .. }
    ));

    let stored = hub.registry.get(&entry.entry_id).unwrap();
    assert_eq!(stored.options, input);
}
