use serde_json::Value;

use crate::context::ServerContext;
use crate::error::ConfluenceError;
use crate::protocol::{GetSpaceParams, LimitParams};

const DEFAULT_SPACES_LIMIT: u32 = 25;

pub async fn get_space(params: GetSpaceParams, ctx: &ServerContext) -> Result<Value, ConfluenceError> {
    ctx.confluence.get_space(&params.space_key).await
}

pub async fn list_spaces(params: LimitParams, ctx: &ServerContext) -> Result<Value, ConfluenceError> {
    ctx.confluence
        .list_spaces(params.limit.unwrap_or(DEFAULT_SPACES_LIMIT))
        .await
}
