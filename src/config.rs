use std::path::PathBuf;
use std::time::Duration;

use crate::store::ConfigStore;

/// Default timeout for outbound Confluence calls (30 seconds).
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Process-level settings, as opposed to the persisted Confluence record.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub config_path: PathBuf,
    pub request_timeout: Duration,
    /// Overrides the record's `logLevel` when set.
    pub log_level: Option<String>,
    /// Prompt on the controlling terminal for a new token after a 401.
    pub tty_renewal: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            config_path: ConfigStore::default_path(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            log_level: None,
            tty_renewal: false,
        }
    }
}
