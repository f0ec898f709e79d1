use serde_json::{json, Value};

/// A tool as advertised by `tools/list`.
#[derive(Debug, Clone)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

impl ToolDefinition {
    pub fn to_json(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "inputSchema": self.input_schema,
        })
    }
}

fn limit_schema(default: u32) -> Value {
    json!({
        "type": "integer",
        "description": format!("Maximum number of results (default {default})"),
        "minimum": 1,
        "maximum": 100
    })
}

fn storage_body_schema(description: &str) -> Value {
    json!({
        "type": "string",
        "description": format!("{description} in Confluence storage format (XHTML, e.g. <p>Text</p>). Markdown and wiki markup are rejected.")
    })
}

/// Every tool this server exposes, in advertised order.
pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "search_confluence",
            description: "Search Confluence content with a CQL query",
            input_schema: json!({
                "type": "object",
                "required": ["query"],
                "properties": {
                    "query": {
                        "type": "string",
                        "minLength": 1,
                        "description": "CQL query, e.g. type=page AND space=DEMO"
                    },
                    "limit": limit_schema(25)
                }
            }),
        },
        ToolDefinition {
            name: "search_pages",
            description: "Free-text search over page titles and content",
            input_schema: json!({
                "type": "object",
                "required": ["query"],
                "properties": {
                    "query": {
                        "type": "string",
                        "minLength": 1,
                        "description": "Words to look for in page titles or text"
                    },
                    "limit": limit_schema(25)
                }
            }),
        },
        ToolDefinition {
            name: "get_recent_pages",
            description: "List the most recently modified pages",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "limit": limit_schema(10)
                }
            }),
        },
        ToolDefinition {
            name: "get_page",
            description: "Get a page by ID, including its storage-format body",
            input_schema: json!({
                "type": "object",
                "required": ["page_id"],
                "properties": {
                    "page_id": {
                        "type": "string",
                        "minLength": 1,
                        "description": "Confluence page ID"
                    },
                    "expand": {
                        "type": "string",
                        "description": "Comma-separated fields to expand (default body.storage,version,space)"
                    }
                }
            }),
        },
        ToolDefinition {
            name: "get_space",
            description: "Get a space by key",
            input_schema: json!({
                "type": "object",
                "required": ["space_key"],
                "properties": {
                    "space_key": {
                        "type": "string",
                        "minLength": 1,
                        "description": "Space key, e.g. DEMO"
                    }
                }
            }),
        },
        ToolDefinition {
            name: "list_spaces",
            description: "List spaces visible to the configured account",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "limit": limit_schema(25)
                }
            }),
        },
        ToolDefinition {
            name: "create_page",
            description: "Create a page in a space, optionally under a parent page",
            input_schema: json!({
                "type": "object",
                "required": ["space_key", "title", "body"],
                "properties": {
                    "space_key": {
                        "type": "string",
                        "minLength": 1,
                        "description": "Key of the space to create the page in"
                    },
                    "title": {
                        "type": "string",
                        "minLength": 1,
                        "description": "Page title"
                    },
                    "body": storage_body_schema("Page content"),
                    "parent_id": {
                        "type": "string",
                        "description": "ID of the parent page"
                    }
                }
            }),
        },
        ToolDefinition {
            name: "update_page",
            description: "Update a page's title and/or body; the version number is handled automatically",
            input_schema: json!({
                "type": "object",
                "required": ["page_id"],
                "properties": {
                    "page_id": {
                        "type": "string",
                        "minLength": 1,
                        "description": "ID of the page to update"
                    },
                    "title": {
                        "type": "string",
                        "minLength": 1,
                        "description": "New title (defaults to the current title)"
                    },
                    "body": storage_body_schema("New content (defaults to the current body)")
                }
            }),
        },
        ToolDefinition {
            name: "setup_confluence",
            description: "Configure Confluence credentials, replace the API token, or validate the stored credentials",
            input_schema: json!({
                "type": "object",
                "required": ["action"],
                "properties": {
                    "action": {
                        "type": "string",
                        "enum": ["setup", "update_token", "validate"],
                        "description": "setup: save new credentials; update_token: replace the API token; validate: check stored credentials"
                    },
                    "base_url": {
                        "type": "string",
                        "description": "Confluence base URL, e.g. https://your-site.atlassian.net/wiki (setup)"
                    },
                    "email": {
                        "type": "string",
                        "description": "Atlassian account email (setup)"
                    },
                    "api_token": {
                        "type": "string",
                        "description": "Atlassian API token (setup, update_token)"
                    }
                },
                "allOf": [
                    {
                        "if": { "properties": { "action": { "const": "setup" } } },
                        "then": { "required": ["base_url", "email", "api_token"] }
                    },
                    {
                        "if": { "properties": { "action": { "const": "update_token" } } },
                        "then": { "required": ["api_token"] }
                    }
                ]
            }),
        },
    ]
}

/// Input schema for `name`, if it is a known tool.
pub fn input_schema(name: &str) -> Option<Value> {
    tool_definitions()
        .into_iter()
        .find(|t| t.name == name)
        .map(|t| t.input_schema)
}

/// Payload for `tools/list`.
pub fn tools_list_payload() -> Value {
    let tools: Vec<Value> = tool_definitions().iter().map(ToolDefinition::to_json).collect();
    json!({ "tools": tools })
}
