//! Confluence REST client wrapper.
//!
//! Every outbound call goes through [`ConfluenceClient::execute`]: the
//! fixed-window limiter is charged, the request is sent with a bounded
//! timeout, and the response is classified. A 401 triggers one token
//! renewal followed by exactly one resubmission.

pub mod api;
pub mod rate_limit;
pub mod renewal;
pub mod transport;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use reqwest::{Method, StatusCode, Url};
use serde_json::Value;
use tokio::sync::RwLock;

use crate::auth::basic_auth_header;
use crate::error::ConfluenceError;
use crate::store::{ConfigStore, ConfluenceConfig};

use rate_limit::FixedWindowLimiter;
use renewal::TokenRenewer;
use transport::{HttpRequest, HttpResponse, HttpTransport, TransportError};

/// One REST call relative to `<baseUrl>/rest/api`.
#[derive(Debug, Clone)]
pub struct ApiCall {
    pub method: Method,
    pub path: Vec<String>,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiCall {
    pub fn new<I, S>(method: Method, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            method,
            path: path.into_iter().map(Into::into).collect(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get<I, S>(path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Method::GET, path)
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Immutable snapshot of the live credentials. Replaced wholesale on
/// setup or renewal, never mutated.
#[derive(Debug)]
pub struct Session {
    config: ConfluenceConfig,
    authorization: String,
    api_root: Url,
}

impl Session {
    fn new(config: ConfluenceConfig) -> Result<Self, ConfluenceError> {
        let mut api_root = Url::parse(&config.base_url).map_err(|e| {
            ConfluenceError::Configuration(format!("invalid baseUrl '{}': {e}", config.base_url))
        })?;
        api_root
            .path_segments_mut()
            .map_err(|_| {
                ConfluenceError::Configuration(format!("baseUrl '{}' cannot be a base URL", config.base_url))
            })?
            .pop_if_empty()
            .extend(["rest", "api"]);

        Ok(Self {
            authorization: basic_auth_header(&config.email, &config.api_token),
            config,
            api_root,
        })
    }

    pub fn config(&self) -> &ConfluenceConfig {
        &self.config
    }

    fn url_for(&self, call: &ApiCall) -> Url {
        let mut url = self.api_root.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.extend(&call.path);
        }
        if !call.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &call.query {
                pairs.append_pair(key, value);
            }
        }
        url
    }
}

/// The single outbound client. Owns the limiter and the live session.
pub struct ConfluenceClient {
    store: ConfigStore,
    transport: Arc<dyn HttpTransport>,
    renewer: Arc<dyn TokenRenewer>,
    timeout: Duration,
    limiter: Mutex<FixedWindowLimiter>,
    session: RwLock<Option<Arc<Session>>>,
}

impl ConfluenceClient {
    /// Build the client. `initial` is the record loaded at startup, if any;
    /// when absent the store is consulted again on first use.
    pub fn new(
        store: ConfigStore,
        transport: Arc<dyn HttpTransport>,
        renewer: Arc<dyn TokenRenewer>,
        timeout: Duration,
        initial: Option<ConfluenceConfig>,
    ) -> Self {
        let limits = initial
            .as_ref()
            .map(|c| c.rate_limit.clone())
            .unwrap_or_default();

        let session = initial.and_then(|config| match Session::new(config) {
            Ok(session) => Some(Arc::new(session)),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unusable startup configuration");
                None
            }
        });

        Self {
            store,
            transport,
            renewer,
            timeout,
            limiter: Mutex::new(FixedWindowLimiter::new(limits.max_requests, limits.window())),
            session: RwLock::new(session),
        }
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    /// Snapshot of the live configuration, if one is installed.
    pub async fn current_config(&self) -> Option<ConfluenceConfig> {
        self.session.read().await.as_ref().map(|s| s.config.clone())
    }

    /// Current session, loading it from the store when none is installed yet.
    async fn session(&self) -> Result<Arc<Session>, ConfluenceError> {
        if let Some(session) = self.session.read().await.as_ref() {
            return Ok(Arc::clone(session));
        }

        match self.store.load()? {
            Some(config) => self.install(config).await,
            None => Err(ConfluenceError::Configuration(
                "Confluence is not configured. Call setup_confluence with action \"setup\" and provide base_url, email and api_token.".into(),
            )),
        }
    }

    /// Swap in a new session built from `config`.
    pub async fn install(&self, config: ConfluenceConfig) -> Result<Arc<Session>, ConfluenceError> {
        let session = Arc::new(Session::new(config)?);
        {
            let limits = &session.config.rate_limit;
            self.limiter
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .reconfigure(limits.max_requests, limits.window());
        }
        *self.session.write().await = Some(Arc::clone(&session));
        tracing::debug!(base_url = %session.config.base_url, "installed Confluence session");
        Ok(session)
    }

    /// Run `call` against the live session, renewing the token once on 401.
    pub async fn execute(&self, call: &ApiCall) -> Result<Value, ConfluenceError> {
        let session = self.session().await?;

        match self.attempt(&session, call).await {
            Err(ConfluenceError::TokenExpired) => {}
            outcome => return outcome,
        }

        tracing::warn!(path = %call.path.join("/"), "Confluence returned 401; renewing API token");
        let renewed = self.renew(&session).await?;

        match self.attempt(&renewed, call).await {
            Err(ConfluenceError::TokenExpired) => Err(ConfluenceError::RenewalFailed(
                "Confluence rejected the renewed token".into(),
            )),
            outcome => outcome,
        }
    }

    /// Live credential check against the current-user endpoint. Never renews.
    pub async fn verify(&self, config: &ConfluenceConfig) -> Result<Value, ConfluenceError> {
        let session = Session::new(config.clone())?;
        self.attempt(&session, &ApiCall::get(["user", "current"])).await
    }

    /// Validate `config` live, then persist it and make it the live session.
    /// Nothing is written unless the live check succeeds.
    pub async fn adopt(&self, mut config: ConfluenceConfig) -> Result<(ConfluenceConfig, Value), ConfluenceError> {
        config.validate()?;
        let user = self.verify(&config).await?;
        config.last_validated = Some(Utc::now());
        self.store.save(&config)?;
        self.install(config.clone()).await?;
        tracing::info!(base_url = %config.base_url, email = %config.email, "Confluence credentials saved");
        Ok((config, user))
    }

    async fn renew(&self, stale: &Session) -> Result<Arc<Session>, ConfluenceError> {
        let token = self.renewer.fresh_token(&stale.config).await.map_err(|e| {
            tracing::warn!(error = %e, "token renewal unavailable");
            ConfluenceError::RenewalFailed(e.to_string())
        })?;

        let mut config = stale.config.clone();
        config.api_token = token;
        config.token_expiry = None;
        config
            .validate()
            .map_err(|e| ConfluenceError::RenewalFailed(e.to_string()))?;
        self.store
            .save(&config)
            .map_err(|e| ConfluenceError::RenewalFailed(e.to_string()))?;

        tracing::info!("API token renewed and saved");
        self.install(config).await
    }

    async fn attempt(&self, session: &Session, call: &ApiCall) -> Result<Value, ConfluenceError> {
        self.limiter
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .try_acquire()
            .map_err(|q| ConfluenceError::ClientRateLimit {
                limit: q.limit,
                window: q.window,
            })?;

        let request = HttpRequest {
            method: call.method.clone(),
            url: session.url_for(call),
            authorization: session.authorization.clone(),
            body: call.body.clone(),
        };
        tracing::debug!(method = %request.method, url = %request.url, "Confluence request");

        let response = match tokio::time::timeout(self.timeout, self.transport.send(request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(TransportError::Timeout)) | Err(_) => {
                return Err(ConfluenceError::Timeout(self.timeout));
            }
            Ok(Err(TransportError::Connection(message))) => {
                return Err(ConfluenceError::Network(message));
            }
        };

        tracing::debug!(status = response.status, "Confluence response");
        classify(response)
    }
}

/// Map a response onto success or the error taxonomy.
fn classify(response: HttpResponse) -> Result<Value, ConfluenceError> {
    match response.status {
        200..=299 => Ok(response.body),
        400 => Err(ConfluenceError::Validation(remote_message(&response))),
        401 => Err(ConfluenceError::TokenExpired),
        403 => Err(ConfluenceError::Authentication(remote_message(&response))),
        429 => Err(ConfluenceError::RemoteRateLimit {
            retry_after: response.retry_after,
        }),
        status => Err(ConfluenceError::Api {
            status,
            message: remote_message(&response),
        }),
    }
}

fn remote_message(response: &HttpResponse) -> String {
    let body = &response.body;
    let from_json = body
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| {
            body.get("errorMessages")
                .and_then(|m| m.get(0))
                .and_then(Value::as_str)
        })
        .filter(|m| !m.trim().is_empty());

    if let Some(message) = from_json {
        return message.to_string();
    }
    if let Some(text) = body.as_str().filter(|t| !t.trim().is_empty()) {
        return text.trim().to_string();
    }

    StatusCode::from_u16(response.status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("no details returned")
        .to_string()
}
