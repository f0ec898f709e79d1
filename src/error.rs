use std::time::Duration;

use crate::content::ContentFormatError;

/// Failure glyph prepended to every user-visible error message.
pub const ERROR_PREFIX: &str = "❌";

/// Every way a Confluence operation can fail.
///
/// All variants are caught at the dispatcher boundary and rendered into the
/// tool (or resource) result; none of them becomes a JSON-RPC error.
#[derive(Debug, thiserror::Error)]
pub enum ConfluenceError {
    #[error("Rate limit exceeded: at most {limit} requests per {window:?}. Wait for the window to reset and retry.")]
    ClientRateLimit { limit: u32, window: Duration },

    #[error("Confluence rate limit hit (HTTP 429){}", retry_after_hint(.retry_after))]
    RemoteRateLimit { retry_after: Option<String> },

    #[error("Permission denied (HTTP 403): {0}")]
    Authentication(String),

    #[error("Authentication failed (HTTP 401): the API token was rejected or has expired")]
    TokenExpired,

    #[error("Token renewal failed: {0}")]
    RenewalFailed(String),

    #[error("Version conflict: page {page_id} was modified concurrently (HTTP 409). Fetch the page again and retry the update.")]
    VersionConflict { page_id: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    ContentFormat(#[from] ContentFormatError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Confluence API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Request timed out after {} seconds", .0.as_secs())]
    Timeout(Duration),

    #[error("Network error: {0}")]
    Network(String),
}

fn retry_after_hint(retry_after: &Option<String>) -> String {
    match retry_after {
        Some(value) => format!(", retry after {value} seconds"),
        None => String::new(),
    }
}

impl ConfluenceError {
    /// Stable machine-readable code, used as a structured log field.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ClientRateLimit { .. } => "client_rate_limit",
            Self::RemoteRateLimit { .. } => "remote_rate_limit",
            Self::Authentication(_) => "authentication",
            Self::TokenExpired => "token_expired",
            Self::RenewalFailed(_) => "renewal_failed",
            Self::VersionConflict { .. } => "version_conflict",
            Self::Validation(_) => "validation",
            Self::ContentFormat(_) => "content_format",
            Self::Configuration(_) => "configuration",
            Self::Api { .. } => "api_error",
            Self::Timeout(_) => "timeout",
            Self::Network(_) => "network",
        }
    }

    /// The message as shown to the calling agent.
    pub fn render(&self) -> String {
        format!("{ERROR_PREFIX} {self}")
    }
}
