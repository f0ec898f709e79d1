use std::io::{BufRead, BufReader, Write};

use async_trait::async_trait;

use crate::store::ConfluenceConfig;

#[derive(Debug, thiserror::Error)]
pub enum RenewalError {
    #[error("no interactive channel available; call setup_confluence with action \"update_token\" to supply a new API token")]
    Unavailable,
    #[error("no token entered")]
    Empty,
    #[error("terminal prompt failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Source of a replacement API token after Confluence answers 401.
#[async_trait]
pub trait TokenRenewer: Send + Sync {
    async fn fresh_token(&self, current: &ConfluenceConfig) -> Result<String, RenewalError>;
}

/// Default for server mode: stdin/stdout carry the protocol, so there is
/// nobody to ask.
#[derive(Debug, Default, Clone, Copy)]
pub struct NonInteractiveRenewer;

#[async_trait]
impl TokenRenewer for NonInteractiveRenewer {
    async fn fresh_token(&self, _current: &ConfluenceConfig) -> Result<String, RenewalError> {
        Err(RenewalError::Unavailable)
    }
}

/// Prompts on the controlling terminal, never on the protocol streams.
#[derive(Debug, Clone)]
pub struct TerminalRenewer {
    tty_path: String,
}

impl Default for TerminalRenewer {
    fn default() -> Self {
        Self {
            tty_path: "/dev/tty".to_string(),
        }
    }
}

#[async_trait]
impl TokenRenewer for TerminalRenewer {
    async fn fresh_token(&self, current: &ConfluenceConfig) -> Result<String, RenewalError> {
        let tty_path = self.tty_path.clone();
        let prompt = format!(
            "Confluence rejected the API token for {} at {}.\nEnter a new API token: ",
            current.email, current.base_url
        );

        let token = tokio::task::spawn_blocking(move || prompt_on_tty(&tty_path, &prompt))
            .await
            .map_err(|e| RenewalError::Io(std::io::Error::other(e.to_string())))??;

        let token = token.trim().to_string();
        if token.is_empty() {
            return Err(RenewalError::Empty);
        }
        Ok(token)
    }
}

fn prompt_on_tty(tty_path: &str, prompt: &str) -> Result<String, RenewalError> {
    let tty = std::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .open(tty_path)
        .map_err(|_| RenewalError::Unavailable)?;

    let mut writer = tty.try_clone()?;
    writer.write_all(prompt.as_bytes())?;
    writer.flush()?;

    let mut line = String::new();
    BufReader::new(tty).read_line(&mut line)?;
    Ok(line)
}
