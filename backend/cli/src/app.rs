//! Wires configuration into the gateway state.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::info;

use folio_assistant::providers::OpenAiCompatProvider;
use folio_assistant::Assistant;
use folio_config::Config;
use folio_core::{ContentStore, Mailer, SystemClock};
use folio_gateway::{AdminCredentials, GatewayState, RateLimiter, SiteInfo};
use folio_integrations::{GithubClient, LogMailer, ResendMailer};

/// Build the gateway state for `config` on top of `store`.
///
/// Optional collaborators are attached only when configured: the LLM when an
/// API key is present, Resend when its key is present, GitHub when a username
/// is present, and admin login when both admin email and hash are present.
pub async fn build_state(config: &Config, store: Arc<dyn ContentStore>) -> Result<GatewayState> {
    let limiter = RateLimiter::from_config(&config.rate_limit, Arc::new(SystemClock)).await;

    let mut state = GatewayState::new(store, Arc::new(limiter))
        .with_site(SiteInfo {
            owner_name: config.site.owner_name.clone(),
            owner_email: config.site.owner_email.clone(),
        })
        .with_mailer(mailer(config)?)
        .with_assistant(assistant(config)?)
        .with_admin(AdminCredentials::from_config(&config.admin));

    if let Some(username) = config.github.username.as_deref() {
        let client = GithubClient::new(username, config.github.token.clone())?
            .with_api_url(&config.github.api_url);
        state = state.with_activity(
            Arc::new(client),
            Duration::from_secs(config.github.cache_ttl_secs),
        );
        info!(username, "GitHub activity enabled");
    }

    Ok(state)
}

fn mailer(config: &Config) -> Result<Arc<dyn Mailer>> {
    match config.mail.resend_api_key.as_deref() {
        Some(key) => {
            let mailer = ResendMailer::new(key, &config.site.from_email)?
                .with_api_url(&config.mail.api_url);
            Ok(Arc::new(mailer))
        }
        None => {
            info!("No mail provider configured, outgoing email is only logged");
            Ok(Arc::new(LogMailer::new()))
        }
    }
}

fn assistant(config: &Config) -> Result<Assistant> {
    let llm = &config.llm;
    let assistant = Assistant::new(&config.site.owner_name, &llm.model)
        .with_sampling(llm.max_tokens, llm.temperature);

    let Some(key) = llm.api_key.as_deref() else {
        info!("No LLM key configured, chatbot uses canned replies");
        return Ok(assistant);
    };

    let provider = OpenAiCompatProvider::new("llm", key, Duration::from_secs(llm.timeout_secs))?
        .with_base_url(&llm.base_url);
    info!(model = %llm.model, "LLM provider registered");
    Ok(assistant.with_provider(Arc::new(provider)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_store::MemoryContentStore;

    fn store() -> Arc<dyn ContentStore> {
        Arc::new(MemoryContentStore::new())
    }

    #[tokio::test]
    async fn defaults_run_without_external_services() {
        let state = build_state(&Config::default(), store()).await.unwrap();

        assert_eq!(state.limiter.backend(), "memory");
        assert_eq!(state.mailer.name(), "log");
        assert!(!state.assistant.has_provider());
        assert!(state.activity.is_none());
        assert!(state.admin.is_none());
        assert_eq!(state.site.owner_name, "Portfolio Owner");
    }

    #[tokio::test]
    async fn configured_collaborators_are_attached() {
        let mut config = Config::default();
        config.site.owner_name = "Ada".into();
        config.site.owner_email = Some("ada@example.com".into());
        config.llm.api_key = Some("sk-test".into());
        config.mail.resend_api_key = Some("re_test".into());
        config.github.username = Some("ada".into());
        config.admin.email = Some("ada@example.com".into());
        config.admin.password_hash = Some(folio_gateway::auth::hash_password("hunter22").unwrap());

        let state = build_state(&config, store()).await.unwrap();

        assert_eq!(state.mailer.name(), "resend");
        assert!(state.assistant.has_provider());
        assert!(state.activity.is_some());
        let admin = state.admin.as_ref().unwrap();
        assert!(admin.verify("ada@example.com", "hunter22"));
        assert_eq!(state.site.owner_email.as_deref(), Some("ada@example.com"));
    }
}
