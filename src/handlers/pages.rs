use serde_json::Value;

use crate::client::api::{NewPage, PageSnapshot, PageUpdate, DEFAULT_PAGE_EXPAND};
use crate::content::validate_storage_format;
use crate::context::ServerContext;
use crate::error::ConfluenceError;
use crate::protocol::{CreatePageParams, GetPageParams, UpdatePageParams};

/// Handle a `get_page` tool call.
pub async fn get_page(params: GetPageParams, ctx: &ServerContext) -> Result<Value, ConfluenceError> {
    ctx.confluence
        .get_page(&params.page_id, params.expand.as_deref())
        .await
}

/// Handle a `create_page` tool call.
///
/// The body must pass the storage-format gate before anything is sent.
pub async fn create_page(params: CreatePageParams, ctx: &ServerContext) -> Result<Value, ConfluenceError> {
    let body = validate_storage_format(&params.body)?;

    let page = NewPage {
        space_key: &params.space_key,
        title: &params.title,
        body,
        parent_id: params.parent_id.as_deref().filter(|id| !id.trim().is_empty()),
    };
    ctx.confluence.create_page(&page).await
}

/// Handle an `update_page` tool call.
///
/// Re-fetches the page for its version, space and current content, then
/// submits version + 1. Unspecified title or body keep their current
/// values byte-for-byte. Confluence arbitrates concurrent updates; a 409
/// surfaces as a version conflict.
pub async fn update_page(params: UpdatePageParams, ctx: &ServerContext) -> Result<Value, ConfluenceError> {
    if let Some(body) = params.body.as_deref() {
        if body.trim().is_empty() {
            return Err(ConfluenceError::Validation(
                "body must not be empty; omit it to keep the current content".into(),
            ));
        }
        validate_storage_format(body)?;
    }

    let current = ctx
        .confluence
        .get_page(&params.page_id, Some(DEFAULT_PAGE_EXPAND))
        .await?;
    let snapshot = PageSnapshot::from_value(&params.page_id, &current)?;

    let title = params.title.as_deref().unwrap_or(&snapshot.title);
    let body = params.body.as_deref().unwrap_or(&snapshot.body);
    if body.trim().is_empty() {
        return Err(ConfluenceError::Validation(format!(
            "page {} has no current body and no new body was given; refusing to save empty content",
            params.page_id
        )));
    }

    let version = snapshot.version.checked_add(1).ok_or_else(|| {
        ConfluenceError::Validation(format!(
            "page {} reports version {}, which cannot be incremented",
            params.page_id, snapshot.version
        ))
    })?;

    let update = PageUpdate {
        page_id: &params.page_id,
        space_key: &snapshot.space_key,
        title,
        body,
        version,
    };
    tracing::debug!(page_id = %params.page_id, version = update.version, "updating page");
    ctx.confluence.update_page(&update).await
}
