//! 401 handling: one renewal, one resubmission, never more.

mod common;

use serde_json::json;

use common::{call_tool, context_with, sample_config, ScriptedRenewer, ScriptedTransport};
use mcp_confluence_server::auth::basic_auth_header;
use mcp_confluence_server::store::ConfigStore;

#[tokio::test]
async fn unauthorized_triggers_one_renewal_and_retry() {
    let tmp = tempfile::tempdir().unwrap();
    let transport = ScriptedTransport::new();
    transport.respond(401, json!({ "message": "Unauthorized" }));
    transport.respond(200, json!({ "results": [{ "key": "DEMO" }] }));
    let renewer = ScriptedRenewer::with_token("new-token");
    let ctx = context_with(tmp.path(), transport.clone(), renewer.clone(), Some(sample_config()));

    let (text, is_error) = call_tool(&ctx, "list_spaces", json!({})).await;
    assert!(!is_error, "got: {text}");

    assert_eq!(renewer.calls(), 1);
    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(
        requests[0].authorization,
        basic_auth_header("dev@example.com", "old-token")
    );
    assert_eq!(
        requests[1].authorization,
        basic_auth_header("dev@example.com", "new-token")
    );

    let saved = ConfigStore::new(tmp.path().join("config.json"))
        .load()
        .unwrap()
        .expect("renewed token must be persisted");
    assert_eq!(saved.api_token, "new-token");
    assert_eq!(
        ctx.confluence.current_config().await.unwrap().api_token,
        "new-token"
    );
}

#[tokio::test]
async fn second_unauthorized_fails_with_renewal_error() {
    let tmp = tempfile::tempdir().unwrap();
    let transport = ScriptedTransport::new();
    transport.respond(401, json!({}));
    transport.respond(401, json!({}));
    transport.respond(200, json!({ "results": [] }));
    let renewer = ScriptedRenewer::with_token("still-bad");
    let ctx = context_with(tmp.path(), transport.clone(), renewer.clone(), Some(sample_config()));

    let (text, is_error) = call_tool(&ctx, "list_spaces", json!({})).await;

    assert!(is_error);
    assert!(text.starts_with("❌ Token renewal failed"), "got: {text}");
    assert_eq!(renewer.calls(), 1);
    assert_eq!(transport.request_count(), 2, "exactly one resubmission");
}

#[tokio::test]
async fn unavailable_renewal_fails_without_retry() {
    let tmp = tempfile::tempdir().unwrap();
    let transport = ScriptedTransport::new();
    transport.respond(401, json!({}));
    let renewer = ScriptedRenewer::refusing();
    let ctx = context_with(tmp.path(), transport.clone(), renewer.clone(), Some(sample_config()));

    let (text, is_error) = call_tool(&ctx, "get_page", json!({ "page_id": "1" })).await;

    assert!(is_error);
    assert!(text.starts_with("❌ Token renewal failed"), "got: {text}");
    assert!(text.contains("update_token"), "should point at the RPC renewal path");
    assert_eq!(transport.request_count(), 1);
    assert!(
        !tmp.path().join("config.json").exists(),
        "failed renewal must not write the config"
    );
}

#[tokio::test]
async fn retry_after_renewal_keeps_normal_classification() {
    let tmp = tempfile::tempdir().unwrap();
    let transport = ScriptedTransport::new();
    transport.respond(401, json!({}));
    transport.respond(404, json!({ "message": "Page not found" }));
    let ctx = context_with(
        tmp.path(),
        transport.clone(),
        ScriptedRenewer::with_token("new-token"),
        Some(sample_config()),
    );

    let (text, is_error) = call_tool(&ctx, "get_page", json!({ "page_id": "404" })).await;
    assert!(is_error);
    assert!(text.contains("HTTP 404"), "got: {text}");
}
