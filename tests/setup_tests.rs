//! `setup_confluence`: validate before persist.

mod common;

use serde_json::{json, Value};

use common::{call_tool, configured_context, context_with, ScriptedRenewer, ScriptedTransport};
use mcp_confluence_server::store::ConfigStore;

fn user_json() -> Value {
    json!({ "accountId": "abc-123", "displayName": "Dev User", "email": "dev@example.com" })
}

#[tokio::test]
async fn setup_with_rejected_token_persists_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let transport = ScriptedTransport::new();
    transport.respond(401, json!({ "message": "Unauthorized" }));
    let renewer = ScriptedRenewer::with_token("should-not-be-used");
    let ctx = context_with(tmp.path(), transport.clone(), renewer.clone(), None);

    let (text, is_error) = call_tool(
        &ctx,
        "setup_confluence",
        json!({
            "action": "setup",
            "base_url": "https://example.atlassian.net/wiki",
            "email": "dev@example.com",
            "api_token": "bad-token"
        }),
    )
    .await;

    assert!(is_error);
    assert!(text.contains("HTTP 401"), "got: {text}");
    assert_eq!(renewer.calls(), 0, "credential checks never renew");
    assert!(!tmp.path().join("config.json").exists());
    assert!(ctx.confluence.current_config().await.is_none());
}

#[tokio::test]
async fn setup_with_valid_token_persists_submitted_fields() {
    let tmp = tempfile::tempdir().unwrap();
    let transport = ScriptedTransport::new();
    transport.respond(200, user_json());
    let ctx = context_with(tmp.path(), transport.clone(), ScriptedRenewer::refusing(), None);

    let (text, is_error) = call_tool(
        &ctx,
        "setup_confluence",
        json!({
            "action": "setup",
            "base_url": "https://example.atlassian.net/wiki/",
            "email": "dev@example.com",
            "api_token": "good-token"
        }),
    )
    .await;
    assert!(!is_error, "got: {text}");
    let summary: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(summary["status"], "configured");
    assert_eq!(summary["user"]["displayName"], "Dev User");

    assert_eq!(
        transport.requests()[0].url.path(),
        "/wiki/rest/api/user/current"
    );

    let saved = ConfigStore::new(tmp.path().join("config.json"))
        .load()
        .unwrap()
        .unwrap();
    assert_eq!(saved.base_url, "https://example.atlassian.net/wiki");
    assert_eq!(saved.email, "dev@example.com");
    assert_eq!(saved.api_token, "good-token");
    assert!(saved.last_validated.is_some());

    let live = ctx.confluence.current_config().await.unwrap();
    assert_eq!(live, saved);
}

#[tokio::test]
async fn setup_requires_full_credentials() {
    let tmp = tempfile::tempdir().unwrap();
    let transport = ScriptedTransport::new();
    let ctx = context_with(tmp.path(), transport.clone(), ScriptedRenewer::refusing(), None);

    let (text, is_error) = call_tool(
        &ctx,
        "setup_confluence",
        json!({ "action": "setup", "email": "dev@example.com" }),
    )
    .await;

    assert!(is_error);
    assert!(text.starts_with("❌ Validation error"), "got: {text}");
    assert_eq!(transport.request_count(), 0);
}

#[tokio::test]
async fn setup_rejects_malformed_email_locally() {
    let tmp = tempfile::tempdir().unwrap();
    let transport = ScriptedTransport::new();
    let ctx = context_with(tmp.path(), transport.clone(), ScriptedRenewer::refusing(), None);

    let (text, is_error) = call_tool(
        &ctx,
        "setup_confluence",
        json!({
            "action": "setup",
            "base_url": "https://example.atlassian.net/wiki",
            "email": "not-an-email",
            "api_token": "tok"
        }),
    )
    .await;

    assert!(is_error);
    assert!(text.contains("email"), "got: {text}");
    assert_eq!(transport.request_count(), 0);
}

#[tokio::test]
async fn update_token_revalidates_before_saving() {
    let tmp = tempfile::tempdir().unwrap();
    let transport = ScriptedTransport::new();
    transport.respond(401, json!({}));
    transport.respond(200, user_json());
    let ctx = configured_context(tmp.path(), transport.clone());

    let (_, is_error) = call_tool(
        &ctx,
        "setup_confluence",
        json!({ "action": "update_token", "api_token": "rejected" }),
    )
    .await;
    assert!(is_error);
    assert!(!tmp.path().join("config.json").exists());
    assert_eq!(
        ctx.confluence.current_config().await.unwrap().api_token,
        "old-token"
    );

    let (text, is_error) = call_tool(
        &ctx,
        "setup_confluence",
        json!({ "action": "update_token", "api_token": "accepted" }),
    )
    .await;
    assert!(!is_error, "got: {text}");

    let saved = ConfigStore::new(tmp.path().join("config.json"))
        .load()
        .unwrap()
        .unwrap();
    assert_eq!(saved.api_token, "accepted");
    assert_eq!(saved.email, "dev@example.com");
}

#[tokio::test]
async fn update_token_without_config_is_configuration_error() {
    let tmp = tempfile::tempdir().unwrap();
    let transport = ScriptedTransport::new();
    let ctx = context_with(tmp.path(), transport.clone(), ScriptedRenewer::refusing(), None);

    let (text, is_error) = call_tool(
        &ctx,
        "setup_confluence",
        json!({ "action": "update_token", "api_token": "tok" }),
    )
    .await;

    assert!(is_error);
    assert!(text.starts_with("❌ Configuration error"), "got: {text}");
}

#[tokio::test]
async fn validate_checks_stored_credentials_without_writing() {
    let tmp = tempfile::tempdir().unwrap();
    let transport = ScriptedTransport::new();
    transport.respond(200, user_json());
    let ctx = configured_context(tmp.path(), transport.clone());

    let (text, is_error) = call_tool(&ctx, "setup_confluence", json!({ "action": "validate" })).await;

    assert!(!is_error, "got: {text}");
    let summary: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(summary["status"], "valid");
    assert!(!tmp.path().join("config.json").exists());
}

#[tokio::test]
async fn invalid_stored_file_is_reported_not_hidden() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(
        tmp.path().join("config.json"),
        r#"{"baseUrl":"https://example.atlassian.net/wiki","email":"dev@example.com","apiToken":"t","rateLimit":{"maxRequests":0,"windowMs":60000}}"#,
    )
    .unwrap();
    let transport = ScriptedTransport::new();
    let ctx = context_with(tmp.path(), transport.clone(), ScriptedRenewer::refusing(), None);

    for args in [
        json!({ "action": "update_token", "api_token": "tok" }),
        json!({ "action": "validate" }),
    ] {
        let (text, is_error) = call_tool(&ctx, "setup_confluence", args).await;
        assert!(is_error);
        assert!(text.starts_with("❌ Configuration error"), "got: {text}");
        assert!(text.contains("is invalid"), "got: {text}");
        assert!(text.contains("maxRequests"), "got: {text}");
    }
    assert_eq!(transport.request_count(), 0);
}
