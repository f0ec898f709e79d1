use crate::client::ConfluenceClient;
use crate::config::ServerConfig;

/// Everything a request handler needs, built once at startup and passed
/// to the dispatcher by reference.
pub struct ServerContext {
    pub config: ServerConfig,
    pub confluence: ConfluenceClient,
}

impl ServerContext {
    pub fn new(config: ServerConfig, confluence: ConfluenceClient) -> Self {
        Self { config, confluence }
    }
}
