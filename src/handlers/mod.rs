pub mod pages;
pub mod resources;
pub mod search;
pub mod setup;
pub mod spaces;
pub mod tools;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::context::ServerContext;
use crate::error::ConfluenceError;
use crate::protocol::{
    InitializeParams, JsonRpcError, JsonRpcRequest, JsonRpcResponse, ResourceReadParams,
    ToolCallParams, ToolResult,
};
use crate::schema::validate_json;

const PROTOCOL_VERSION: &str = "2024-11-05";

/// Dispatch a JSON-RPC request to the appropriate handler.
///
/// Returns `None` for notifications (no response required).
pub async fn dispatch(req: &JsonRpcRequest, ctx: &ServerContext) -> Option<JsonRpcResponse> {
    match req.method.as_str() {
        "initialize" => {
            if let Some(params) = req
                .params
                .as_ref()
                .and_then(|v| serde_json::from_value::<InitializeParams>(v.clone()).ok())
            {
                let client = params.client_info.as_ref();
                tracing::info!(
                    protocol_version = params.protocol_version.as_deref().unwrap_or("unknown"),
                    client = client.and_then(|c| c.name.as_deref()).unwrap_or("unknown"),
                    client_version = client.and_then(|c| c.version.as_deref()).unwrap_or("unknown"),
                    "client initializing"
                );
            }

            let result = serde_json::json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {
                    "tools": {},
                    "resources": {}
                },
                "serverInfo": {
                    "name": "mcp-confluence-server",
                    "version": env!("CARGO_PKG_VERSION")
                }
            });
            Some(JsonRpcResponse::success(req.id.clone(), result))
        }

        "notifications/initialized" => None,

        "ping" => Some(JsonRpcResponse::success(req.id.clone(), serde_json::json!({}))),

        "tools/list" => Some(JsonRpcResponse::success(
            req.id.clone(),
            tools::tools_list_payload(),
        )),

        "tools/call" => {
            let params: ToolCallParams = match required_params(req, "tools/call") {
                Ok(p) => p,
                Err(err) => return Some(JsonRpcResponse::error(req.id.clone(), err)),
            };

            let tool_result = dispatch_tool_call(&params, ctx).await;
            Some(to_response(req, &tool_result))
        }

        "resources/list" => Some(JsonRpcResponse::success(
            req.id.clone(),
            resources::resources_list_payload(),
        )),

        "resources/read" => {
            let params: ResourceReadParams = match required_params(req, "resources/read") {
                Ok(p) => p,
                Err(err) => return Some(JsonRpcResponse::error(req.id.clone(), err)),
            };

            match resources::read(&params.uri, ctx).await {
                Some(result) => Some(to_response(req, &result)),
                None => Some(JsonRpcResponse::error(
                    req.id.clone(),
                    JsonRpcError::invalid_params(format!("Unknown resource: {}", params.uri)),
                )),
            }
        }

        _ if req.id.is_none() => None,

        _ => Some(JsonRpcResponse::error(
            req.id.clone(),
            JsonRpcError::method_not_found(&req.method),
        )),
    }
}

fn required_params<T: DeserializeOwned>(req: &JsonRpcRequest, method: &str) -> Result<T, JsonRpcError> {
    match &req.params {
        Some(v) => serde_json::from_value(v.clone())
            .map_err(|e| JsonRpcError::invalid_params(format!("Invalid {method} params: {e}"))),
        None => Err(JsonRpcError::invalid_params(format!("Missing params for {method}"))),
    }
}

fn to_response<T: serde::Serialize>(req: &JsonRpcRequest, result: &T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(req.id.clone(), value),
        Err(e) => JsonRpcResponse::error(
            req.id.clone(),
            JsonRpcError::internal_error(format!("Failed to serialize result: {e}")),
        ),
    }
}

async fn dispatch_tool_call(params: &ToolCallParams, ctx: &ServerContext) -> ToolResult {
    let name = params.name.as_str();
    let arguments = params
        .arguments
        .clone()
        .unwrap_or_else(|| Value::Object(Default::default()));

    tracing::debug!(tool = name, "tool call");

    // Each arm parses its own argument type; `?` exits the arm's async block.
    let result: Result<Value, ConfluenceError> = match name {
        "search_confluence" => async { search::search_confluence(parse_arguments(name, arguments)?, ctx).await }.await,
        "search_pages" => async { search::search_pages(parse_arguments(name, arguments)?, ctx).await }.await,
        "get_recent_pages" => async { search::get_recent_pages(parse_arguments(name, arguments)?, ctx).await }.await,
        "get_page" => async { pages::get_page(parse_arguments(name, arguments)?, ctx).await }.await,
        "create_page" => async { pages::create_page(parse_arguments(name, arguments)?, ctx).await }.await,
        "update_page" => async { pages::update_page(parse_arguments(name, arguments)?, ctx).await }.await,
        "get_space" => async { spaces::get_space(parse_arguments(name, arguments)?, ctx).await }.await,
        "list_spaces" => async { spaces::list_spaces(parse_arguments(name, arguments)?, ctx).await }.await,
        "setup_confluence" => async { setup::setup_confluence(parse_arguments(name, arguments)?, ctx).await }.await,
        _ => {
            return ToolResult::error(format!(
                "{} Unknown tool: {name}",
                crate::error::ERROR_PREFIX
            ))
        }
    };

    match result {
        Ok(value) => ToolResult::json(&value),
        Err(err) => {
            tracing::warn!(tool = name, code = err.code(), error = %err, "tool call failed");
            err.into()
        }
    }
}

/// Check `arguments` against the tool's input schema, then deserialize.
fn parse_arguments<T: DeserializeOwned>(tool: &str, arguments: Value) -> Result<T, ConfluenceError> {
    if let Some(schema) = tools::input_schema(tool) {
        validate_json(&schema, &arguments).map_err(|e| {
            ConfluenceError::Validation(format!("Invalid arguments for {tool}: {e}"))
        })?;
    }

    serde_json::from_value(arguments)
        .map_err(|e| ConfluenceError::Validation(format!("Invalid arguments for {tool}: {e}")))
}
