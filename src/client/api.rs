use reqwest::Method;
use serde_json::{json, Value};

use super::{ApiCall, ConfluenceClient};
use crate::error::ConfluenceError;

/// Expansions requested by `get_page` when the caller names none.
pub const DEFAULT_PAGE_EXPAND: &str = "body.storage,version,space";

/// CQL listing pages by last modification, newest first.
pub const RECENT_PAGES_CQL: &str = "type=page ORDER BY lastModified DESC";

/// Free-text query wrapped into a title-or-text CQL expression.
pub fn text_search_cql(query: &str) -> String {
    let escaped = query.replace('\\', "\\\\").replace('"', "\\\"");
    format!(r#"type=page AND (title ~ "{escaped}" OR text ~ "{escaped}")"#)
}

/// A page to be created.
#[derive(Debug, Clone)]
pub struct NewPage<'a> {
    pub space_key: &'a str,
    pub title: &'a str,
    pub body: &'a str,
    pub parent_id: Option<&'a str>,
}

/// A full replacement of a page's title and body at a given version.
#[derive(Debug, Clone)]
pub struct PageUpdate<'a> {
    pub page_id: &'a str,
    pub space_key: &'a str,
    pub title: &'a str,
    pub body: &'a str,
    pub version: u64,
}

/// The fields of a fetched page an update needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSnapshot {
    pub title: String,
    pub space_key: String,
    pub version: u64,
    pub body: String,
}

impl PageSnapshot {
    pub fn from_value(page_id: &str, page: &Value) -> Result<Self, ConfluenceError> {
        let missing = |field: &str| {
            ConfluenceError::Validation(format!("page {page_id} response is missing {field}"))
        };

        let version = page
            .pointer("/version/number")
            .and_then(Value::as_u64)
            .ok_or_else(|| missing("version.number"))?;
        let space_key = page
            .pointer("/space/key")
            .and_then(Value::as_str)
            .ok_or_else(|| missing("space.key"))?;
        let title = page
            .get("title")
            .and_then(Value::as_str)
            .ok_or_else(|| missing("title"))?;
        let body = page
            .pointer("/body/storage/value")
            .and_then(Value::as_str)
            .unwrap_or_default();

        Ok(Self {
            title: title.to_string(),
            space_key: space_key.to_string(),
            version,
            body: body.to_string(),
        })
    }
}

fn storage_body(value: &str) -> Value {
    json!({
        "storage": {
            "value": value,
            "representation": "storage"
        }
    })
}

impl ConfluenceClient {
    /// CQL search; the query is passed through verbatim.
    pub async fn search(&self, cql: &str, limit: u32) -> Result<Value, ConfluenceError> {
        self.execute(
            &ApiCall::get(["content", "search"])
                .query("cql", cql)
                .query("limit", limit),
        )
        .await
    }

    pub async fn get_page(&self, page_id: &str, expand: Option<&str>) -> Result<Value, ConfluenceError> {
        let expand = expand
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .unwrap_or(DEFAULT_PAGE_EXPAND);
        self.execute(&ApiCall::get(["content", page_id]).query("expand", expand))
            .await
    }

    pub async fn get_space(&self, space_key: &str) -> Result<Value, ConfluenceError> {
        self.execute(&ApiCall::get(["space", space_key])).await
    }

    pub async fn list_spaces(&self, limit: u32) -> Result<Value, ConfluenceError> {
        self.execute(&ApiCall::get(["space"]).query("limit", limit))
            .await
    }

    pub async fn current_user(&self) -> Result<Value, ConfluenceError> {
        self.execute(&ApiCall::get(["user", "current"])).await
    }

    pub async fn create_page(&self, page: &NewPage<'_>) -> Result<Value, ConfluenceError> {
        let mut payload = json!({
            "type": "page",
            "title": page.title,
            "space": { "key": page.space_key },
            "body": storage_body(page.body),
        });
        if let Some(parent_id) = page.parent_id {
            payload["ancestors"] = json!([{ "id": parent_id }]);
        }

        self.execute(&ApiCall::new(Method::POST, ["content"]).json(payload))
            .await
    }

    /// Submit `update`; a 409 from Confluence becomes [`ConfluenceError::VersionConflict`].
    pub async fn update_page(&self, update: &PageUpdate<'_>) -> Result<Value, ConfluenceError> {
        let payload = json!({
            "id": update.page_id,
            "type": "page",
            "title": update.title,
            "space": { "key": update.space_key },
            "body": storage_body(update.body),
            "version": { "number": update.version },
        });

        self.execute(&ApiCall::new(Method::PUT, ["content", update.page_id]).json(payload))
            .await
            .map_err(|e| match e {
                ConfluenceError::Api { status: 409, .. } => ConfluenceError::VersionConflict {
                    page_id: update.page_id.to_string(),
                },
                other => other,
            })
    }
}
