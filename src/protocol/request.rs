use serde::{Deserialize, Serialize};

/// JSON-RPC 2.0 request ID, either a number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RpcId {
    Number(i64),
    Str(String),
}

/// JSON-RPC 2.0 request envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: Option<RpcId>,
    pub method: String,
    pub params: Option<serde_json::Value>,
}

/// MCP `initialize` params.
#[derive(Debug, Clone, Deserialize)]
pub struct InitializeParams {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: Option<String>,
    #[serde(rename = "clientInfo")]
    pub client_info: Option<ClientInfo>,
}

/// Client information sent during `initialize`.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientInfo {
    pub name: Option<String>,
    pub version: Option<String>,
}

/// Parameters for `tools/call`.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallParams {
    pub name: String,
    pub arguments: Option<serde_json::Value>,
}

/// Parameters for `resources/read`.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceReadParams {
    pub uri: String,
}

/// `search_confluence` and `search_pages`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchParams {
    pub query: String,
    pub limit: Option<u32>,
}

/// `get_recent_pages` and `list_spaces`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LimitParams {
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetPageParams {
    pub page_id: String,
    /// Comma-separated expansions, e.g. `body.storage,version`.
    pub expand: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetSpaceParams {
    pub space_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePageParams {
    pub space_key: String,
    pub title: String,
    pub body: String,
    pub parent_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePageParams {
    pub page_id: String,
    pub title: Option<String>,
    pub body: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetupAction {
    Setup,
    UpdateToken,
    Validate,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetupParams {
    pub action: SetupAction,
    pub base_url: Option<String>,
    pub email: Option<String>,
    pub api_token: Option<String>,
}
