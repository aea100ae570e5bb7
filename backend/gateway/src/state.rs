//! Application state shared across routes.

use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::sync::Cache;

use folio_assistant::Assistant;
use folio_core::{ActivitySource, ContentStore, GithubActivity, Mailer};
use folio_integrations::LogMailer;

use crate::auth::AdminCredentials;
use crate::rate_limit::RateLimiter;
use crate::session_registry::SessionRegistry;

/// Who the site belongs to; used in chatbot prompts and email.
#[derive(Debug, Clone)]
pub struct SiteInfo {
    pub owner_name: String,
    /// Where contact-form notifications go. No notification when unset.
    pub owner_email: Option<String>,
}

#[derive(Clone)]
pub struct GatewayState {
    pub limiter: Arc<RateLimiter>,
    pub store: Arc<dyn ContentStore>,
    pub mailer: Arc<dyn Mailer>,
    pub assistant: Arc<Assistant>,
    pub activity: Option<Arc<dyn ActivitySource>>,
    pub activity_cache: Cache<&'static str, GithubActivity>,
    pub sessions: SessionRegistry,
    pub admin: Option<AdminCredentials>,
    pub site: Arc<SiteInfo>,
    pub started_at: Instant,
}

impl GatewayState {
    /// State with log-only email, canned chatbot replies, no GitHub
    /// integration, and admin login disabled.
    pub fn new(store: Arc<dyn ContentStore>, limiter: Arc<RateLimiter>) -> Self {
        let owner_name = "Portfolio Owner".to_string();
        Self {
            limiter,
            store,
            mailer: Arc::new(LogMailer::new()),
            assistant: Arc::new(Assistant::new(&owner_name, "none")),
            activity: None,
            activity_cache: activity_cache(Duration::from_secs(600)),
            sessions: SessionRegistry::new(),
            admin: None,
            site: Arc::new(SiteInfo {
                owner_name,
                owner_email: None,
            }),
            started_at: Instant::now(),
        }
    }

    pub fn with_site(mut self, site: SiteInfo) -> Self {
        self.site = Arc::new(site);
        self
    }

    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = mailer;
        self
    }

    pub fn with_assistant(mut self, assistant: Assistant) -> Self {
        self.assistant = Arc::new(assistant);
        self
    }

    pub fn with_activity(mut self, source: Arc<dyn ActivitySource>, ttl: Duration) -> Self {
        self.activity = Some(source);
        self.activity_cache = activity_cache(ttl);
        self
    }

    pub fn with_admin(mut self, admin: Option<AdminCredentials>) -> Self {
        self.admin = admin;
        self
    }
}

fn activity_cache(ttl: Duration) -> Cache<&'static str, GithubActivity> {
    Cache::builder().max_capacity(1).time_to_live(ttl).build()
}
