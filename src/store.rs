//! Persisted Confluence credentials and settings.
//!
//! The record lives in a single JSON file, by default
//! `<config dir>/confluence-mcp/config.json`, written with owner-only
//! permissions because the API token is stored in clear text.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ConfluenceError;

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_MAX_REQUESTS: u32 = 100;
const DEFAULT_WINDOW_MS: u64 = 60_000;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern must compile")
});

/// Client-side rate-limit quota.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitSettings {
    pub max_requests: u32,
    pub window_ms: u64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            max_requests: DEFAULT_MAX_REQUESTS,
            window_ms: DEFAULT_WINDOW_MS,
        }
    }
}

impl RateLimitSettings {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

/// Credentials and settings for one Confluence site.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfluenceConfig {
    pub base_url: String,
    pub email: String,
    pub api_token: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub rate_limit: RateLimitSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_expiry: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_validated: Option<DateTime<Utc>>,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl fmt::Debug for ConfluenceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfluenceConfig")
            .field("base_url", &self.base_url)
            .field("email", &self.email)
            .field("api_token", &"<redacted>")
            .field("log_level", &self.log_level)
            .field("rate_limit", &self.rate_limit)
            .field("token_expiry", &self.token_expiry)
            .field("last_validated", &self.last_validated)
            .finish()
    }
}

impl ConfluenceConfig {
    /// A record with default settings for the given credentials.
    pub fn new(
        base_url: impl Into<String>,
        email: impl Into<String>,
        api_token: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            email: email.into(),
            api_token: api_token.into(),
            log_level: default_log_level(),
            rate_limit: RateLimitSettings::default(),
            token_expiry: None,
            last_validated: None,
        }
    }

    /// Build a record from `CONFLUENCE_BASE_URL`, `CONFLUENCE_EMAIL` and
    /// `CONFLUENCE_API_TOKEN`. Returns `None` unless all three are set.
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("CONFLUENCE_BASE_URL").ok()?;
        let email = std::env::var("CONFLUENCE_EMAIL").ok()?;
        let api_token = std::env::var("CONFLUENCE_API_TOKEN").ok()?;
        Some(Self::new(base_url, email, api_token))
    }

    /// Check the record's invariants.
    pub fn validate(&self) -> Result<(), ConfluenceError> {
        let url = reqwest::Url::parse(&self.base_url).map_err(|e| {
            ConfluenceError::Validation(format!("baseUrl '{}' is not a valid URL: {e}", self.base_url))
        })?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(ConfluenceError::Validation(format!(
                "baseUrl '{}' must be an http(s) URL with a host",
                self.base_url
            )));
        }

        if !EMAIL.is_match(&self.email) {
            return Err(ConfluenceError::Validation(format!(
                "email '{}' is not a valid address",
                self.email
            )));
        }

        if self.api_token.trim().is_empty() {
            return Err(ConfluenceError::Validation("apiToken must not be empty".into()));
        }

        if self.rate_limit.max_requests == 0 || self.rate_limit.window_ms == 0 {
            return Err(ConfluenceError::Validation(
                "rateLimit.maxRequests and rateLimit.windowMs must be at least 1".into(),
            ));
        }

        Ok(())
    }
}

/// Reads and writes the configuration file.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/confluence-mcp/config.json`, falling back to the
    /// working directory when the platform has no config dir.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("confluence-mcp")
            .join("config.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted record. `Ok(None)` means no file exists yet.
    pub fn load(&self) -> Result<Option<ConfluenceConfig>, ConfluenceError> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ConfluenceError::Configuration(format!(
                    "cannot read {}: {e}",
                    self.path.display()
                )))
            }
        };

        let config: ConfluenceConfig = serde_json::from_str(&data).map_err(|e| {
            ConfluenceError::Configuration(format!("{} is not a valid config file: {e}", self.path.display()))
        })?;

        config.validate().map_err(|e| {
            ConfluenceError::Configuration(format!("{} is invalid: {e}", self.path.display()))
        })?;

        Ok(Some(config))
    }

    /// Persist `config`, replacing any existing file.
    pub fn save(&self, config: &ConfluenceConfig) -> Result<(), ConfluenceError> {
        self.write(config).map_err(|e| {
            ConfluenceError::Configuration(format!("cannot write {}: {e}", self.path.display()))
        })
    }

    fn write(&self, config: &ConfluenceConfig) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let data = serde_json::to_string_pretty(config)?;

        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(&self.path)?;
        // `mode` only applies on creation; tighten a pre-existing file too.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
        }
        file.write_all(data.as_bytes())?;
        file.write_all(b"\n")?;

        Ok(())
    }
}

#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

#[cfg(not(unix))]
trait OpenOptionsExt {
    fn mode(&mut self, _mode: u32) -> &mut Self;
}

#[cfg(not(unix))]
impl OpenOptionsExt for std::fs::OpenOptions {
    fn mode(&mut self, _mode: u32) -> &mut Self {
        self
    }
}
