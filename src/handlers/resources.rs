use serde_json::{json, Value};

use crate::client::api::RECENT_PAGES_CQL;
use crate::content::STORAGE_FORMAT_GUIDE;
use crate::context::ServerContext;
use crate::error::ERROR_PREFIX;
use crate::protocol::ResourceReadResult;

pub const SPACES_URI: &str = "confluence://spaces";
pub const RECENT_PAGES_URI: &str = "confluence://recent-pages";
pub const CURRENT_USER_URI: &str = "confluence://user/current";
pub const STORAGE_FORMAT_URI: &str = "confluence://docs/storage-format";

const RESOURCE_SPACES_LIMIT: u32 = 50;
const RESOURCE_RECENT_LIMIT: u32 = 10;

struct ResourceDefinition {
    uri: &'static str,
    name: &'static str,
    description: &'static str,
    mime_type: &'static str,
}

fn resource_definitions() -> [ResourceDefinition; 4] {
    [
        ResourceDefinition {
            uri: SPACES_URI,
            name: "Confluence spaces",
            description: "Spaces visible to the configured account",
            mime_type: "application/json",
        },
        ResourceDefinition {
            uri: RECENT_PAGES_URI,
            name: "Recent pages",
            description: "Most recently modified pages",
            mime_type: "application/json",
        },
        ResourceDefinition {
            uri: CURRENT_USER_URI,
            name: "Current user",
            description: "The Confluence user the server authenticates as",
            mime_type: "application/json",
        },
        ResourceDefinition {
            uri: STORAGE_FORMAT_URI,
            name: "Storage format guide",
            description: "How to write page bodies in Confluence storage format",
            mime_type: "text/markdown",
        },
    ]
}

/// Payload for `resources/list`.
pub fn resources_list_payload() -> Value {
    let resources: Vec<Value> = resource_definitions()
        .iter()
        .map(|res| {
            json!({
                "uri": res.uri,
                "name": res.name,
                "description": res.description,
                "mimeType": res.mime_type
            })
        })
        .collect();
    json!({ "resources": resources })
}

/// Read a resource. Returns `None` for an unknown URI.
///
/// Failures, including a missing configuration, come back as a single
/// plain-text content block rather than a protocol error.
pub async fn read(uri: &str, ctx: &ServerContext) -> Option<ResourceReadResult> {
    let outcome = match uri {
        SPACES_URI => ctx.confluence.list_spaces(RESOURCE_SPACES_LIMIT).await,
        RECENT_PAGES_URI => {
            ctx.confluence
                .search(RECENT_PAGES_CQL, RESOURCE_RECENT_LIMIT)
                .await
        }
        CURRENT_USER_URI => ctx.confluence.current_user().await,
        STORAGE_FORMAT_URI => {
            return Some(ResourceReadResult::text(
                uri,
                "text/markdown",
                STORAGE_FORMAT_GUIDE,
            ))
        }
        _ => return None,
    };

    Some(match outcome {
        Ok(value) => match serde_json::to_string_pretty(&value) {
            Ok(text) => ResourceReadResult::text(uri, "application/json", text),
            Err(e) => ResourceReadResult::text(
                uri,
                "text/plain",
                format!("{ERROR_PREFIX} Failed to serialize response: {e}"),
            ),
        },
        Err(err) => {
            tracing::warn!(uri, code = err.code(), error = %err, "resource read failed");
            ResourceReadResult::error(uri, &err)
        }
    })
}
