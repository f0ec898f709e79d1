//! Shared fixtures: a scripted transport standing in for Confluence and a
//! scripted token renewer.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use mcp_confluence_server::client::renewal::{RenewalError, TokenRenewer};
use mcp_confluence_server::client::transport::{
    HttpRequest, HttpResponse, HttpTransport, TransportError,
};
use mcp_confluence_server::client::ConfluenceClient;
use mcp_confluence_server::config::ServerConfig;
use mcp_confluence_server::context::ServerContext;
use mcp_confluence_server::handlers;
use mcp_confluence_server::protocol::{JsonRpcRequest, RpcId};
use mcp_confluence_server::store::{ConfigStore, ConfluenceConfig};

/// Replays queued responses in order and records every request.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, status: u16, body: Value) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(HttpResponse::json(status, body)));
    }

    pub fn fail(&self, err: TransportError) {
        self.responses.lock().unwrap().push_back(Err(err));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Connection("no scripted response left".into())))
    }
}

/// Hands out a fixed token (or refuses) and counts how often it was asked.
pub struct ScriptedRenewer {
    token: Option<String>,
    calls: Mutex<u32>,
}

impl ScriptedRenewer {
    pub fn with_token(token: &str) -> Arc<Self> {
        Arc::new(Self {
            token: Some(token.to_string()),
            calls: Mutex::new(0),
        })
    }

    pub fn refusing() -> Arc<Self> {
        Arc::new(Self {
            token: None,
            calls: Mutex::new(0),
        })
    }

    pub fn calls(&self) -> u32 {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl TokenRenewer for ScriptedRenewer {
    async fn fresh_token(&self, _current: &ConfluenceConfig) -> Result<String, RenewalError> {
        *self.calls.lock().unwrap() += 1;
        self.token.clone().ok_or(RenewalError::Unavailable)
    }
}

pub fn sample_config() -> ConfluenceConfig {
    ConfluenceConfig::new("https://example.atlassian.net/wiki", "dev@example.com", "old-token")
}

pub fn context_with(
    config_dir: &Path,
    transport: Arc<ScriptedTransport>,
    renewer: Arc<dyn TokenRenewer>,
    initial: Option<ConfluenceConfig>,
) -> ServerContext {
    let config_path = config_dir.join("config.json");
    let server_config = ServerConfig {
        config_path: config_path.clone(),
        request_timeout: Duration::from_secs(30),
        log_level: None,
        tty_renewal: false,
    };
    let client = ConfluenceClient::new(
        ConfigStore::new(config_path),
        transport,
        renewer,
        server_config.request_timeout,
        initial,
    );
    ServerContext::new(server_config, client)
}

/// A configured context that refuses token renewal.
pub fn configured_context(config_dir: &Path, transport: Arc<ScriptedTransport>) -> ServerContext {
    context_with(
        config_dir,
        transport,
        ScriptedRenewer::refusing(),
        Some(sample_config()),
    )
}

pub fn tool_call(id: i64, name: &str, arguments: Value) -> JsonRpcRequest {
    JsonRpcRequest {
        jsonrpc: "2.0".into(),
        id: Some(RpcId::Number(id)),
        method: "tools/call".into(),
        params: Some(json!({ "name": name, "arguments": arguments })),
    }
}

/// Dispatch a tool call and return `(text, is_error)` from the tool result.
pub async fn call_tool(ctx: &ServerContext, name: &str, arguments: Value) -> (String, bool) {
    let response = handlers::dispatch(&tool_call(1, name, arguments), ctx)
        .await
        .expect("tools/call must produce a response");
    assert!(response.error.is_none(), "tool failures must not be JSON-RPC errors");
    let result = response.result.expect("tools/call must produce a result");
    let text = result["content"][0]["text"].as_str().unwrap().to_string();
    let is_error = result["isError"].as_bool().unwrap_or(false);
    (text, is_error)
}

pub fn page_json(id: &str, title: &str, version: u64, body: &str) -> Value {
    json!({
        "id": id,
        "type": "page",
        "title": title,
        "space": { "key": "DEMO", "name": "Demo" },
        "version": { "number": version },
        "body": { "storage": { "value": body, "representation": "storage" } }
    })
}
