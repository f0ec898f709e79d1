use serde_json::Value;

use crate::client::api::{text_search_cql, RECENT_PAGES_CQL};
use crate::context::ServerContext;
use crate::error::ConfluenceError;
use crate::protocol::{LimitParams, SearchParams};

const DEFAULT_SEARCH_LIMIT: u32 = 25;
const DEFAULT_RECENT_LIMIT: u32 = 10;

/// Handle a `search_confluence` tool call. The CQL is passed through verbatim.
pub async fn search_confluence(params: SearchParams, ctx: &ServerContext) -> Result<Value, ConfluenceError> {
    let limit = params.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
    ctx.confluence.search(&params.query, limit).await
}

/// Handle a `search_pages` tool call.
pub async fn search_pages(params: SearchParams, ctx: &ServerContext) -> Result<Value, ConfluenceError> {
    let limit = params.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
    ctx.confluence
        .search(&text_search_cql(&params.query), limit)
        .await
}

/// Handle a `get_recent_pages` tool call.
pub async fn get_recent_pages(params: LimitParams, ctx: &ServerContext) -> Result<Value, ConfluenceError> {
    let limit = params.limit.unwrap_or(DEFAULT_RECENT_LIMIT);
    ctx.confluence.search(RECENT_PAGES_CQL, limit).await
}
