use serde_json::{json, Value};

use crate::context::ServerContext;
use crate::error::ConfluenceError;
use crate::protocol::{SetupAction, SetupParams};
use crate::store::ConfluenceConfig;

/// Handle a `setup_confluence` tool call.
///
/// `setup` and `update_token` validate the credentials live before
/// anything is persisted; `validate` checks the stored credentials and
/// changes nothing.
pub async fn setup_confluence(params: SetupParams, ctx: &ServerContext) -> Result<Value, ConfluenceError> {
    match params.action {
        SetupAction::Setup => {
            let (Some(base_url), Some(email), Some(api_token)) =
                (params.base_url, params.email, params.api_token)
            else {
                return Err(ConfluenceError::Validation(
                    "action \"setup\" requires base_url, email and api_token".into(),
                ));
            };

            let mut config = ConfluenceConfig::new(base_url, email.trim(), api_token.trim());
            if let Ok(Some(existing)) = stored_config(ctx).await {
                config.log_level = existing.log_level;
                config.rate_limit = existing.rate_limit;
            }

            let (saved, user) = ctx.confluence.adopt(config).await?;
            Ok(summary("configured", &saved, user, ctx))
        }

        SetupAction::UpdateToken => {
            let Some(api_token) = params.api_token.filter(|t| !t.trim().is_empty()) else {
                return Err(ConfluenceError::Validation(
                    "action \"update_token\" requires api_token".into(),
                ));
            };
            let Some(mut config) = stored_config(ctx).await? else {
                return Err(not_configured());
            };

            config.api_token = api_token.trim().to_string();
            config.token_expiry = None;
            let (saved, user) = ctx.confluence.adopt(config).await?;
            Ok(summary("token_updated", &saved, user, ctx))
        }

        SetupAction::Validate => {
            let Some(config) = stored_config(ctx).await? else {
                return Err(not_configured());
            };
            let user = ctx.confluence.verify(&config).await?;
            Ok(summary("valid", &config, user, ctx))
        }
    }
}

/// Live configuration, or whatever the store holds if nothing is live.
/// An unreadable or invalid file is an error, not "unconfigured".
async fn stored_config(ctx: &ServerContext) -> Result<Option<ConfluenceConfig>, ConfluenceError> {
    match ctx.confluence.current_config().await {
        Some(config) => Ok(Some(config)),
        None => ctx.confluence.store().load(),
    }
}

fn not_configured() -> ConfluenceError {
    ConfluenceError::Configuration(
        "no stored credentials; run setup_confluence with action \"setup\" first".into(),
    )
}

fn summary(status: &str, config: &ConfluenceConfig, user: Value, ctx: &ServerContext) -> Value {
    json!({
        "status": status,
        "baseUrl": config.base_url,
        "email": config.email,
        "lastValidated": config.last_validated,
        "configPath": ctx.confluence.store().path().display().to_string(),
        "user": {
            "accountId": user.get("accountId"),
            "displayName": user.get("displayName"),
            "email": user.get("email"),
        }
    })
}
