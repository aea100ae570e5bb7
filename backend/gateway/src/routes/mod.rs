//! API route handlers and the pipeline steps they share.
//!
//! Public write endpoints run, in order: client identifier, rate limit,
//! body validation, then the collaborator call.

pub mod admin;
pub mod auth;
pub mod chat;
pub mod contact;
pub mod content;
pub mod github;
pub mod health;
pub mod newsletter;

use axum::{
    Router,
    async_trait,
    extract::{FromRequestParts, Path},
    http::request::Parts,
    routing::{get, patch, post, put},
};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use folio_core::{ContentStore, FolioResult};
use folio_logging::{EventLogger, RequestEvent};

use crate::error::ApiError;
use crate::rate_limit::RateLimitPolicy;
use crate::state::GatewayState;
use crate::validation::{Schema, validate};

pub fn api_router() -> Router<GatewayState> {
    Router::new()
        .route("/api/health", get(health::get_health))
        .route("/api/chat", post(chat::chat))
        .route("/api/contact", post(contact::submit_contact))
        .route("/api/newsletter", post(newsletter::subscribe))
        .route("/api/projects", get(content::list_projects))
        .route("/api/skills", get(content::list_skills))
        .route("/api/blog", get(content::list_posts))
        .route("/api/blog/:slug", get(content::get_post))
        .route("/api/github/activity", get(github::get_activity))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route(
            "/api/admin/projects",
            get(admin::list_projects).post(admin::create_project),
        )
        .route(
            "/api/admin/projects/:id",
            put(admin::update_project).delete(admin::delete_project),
        )
        .route(
            "/api/admin/skills",
            get(admin::list_skills).post(admin::create_skill),
        )
        .route(
            "/api/admin/skills/:id",
            put(admin::update_skill).delete(admin::delete_skill),
        )
        .route(
            "/api/admin/posts",
            get(admin::list_posts).post(admin::create_post),
        )
        .route(
            "/api/admin/posts/:id",
            put(admin::update_post).delete(admin::delete_post),
        )
        .route("/api/admin/contacts", get(admin::list_contacts))
        .route(
            "/api/admin/contacts/:id",
            patch(admin::update_contact).delete(admin::delete_contact),
        )
        .route("/api/admin/subscribers", get(admin::list_subscribers))
}

/// `:id` path segment parsed as a UUID; malformed ids become a JSON 400.
#[derive(Debug, Clone, Copy)]
pub struct EntityId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for EntityId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<Uuid>::from_request_parts(parts, state).await?;
        Ok(EntityId(id))
    }
}

/// Count the request against `policy`; `Err` carries the 429.
pub(crate) async fn enforce_rate_limit(
    state: &GatewayState,
    policy: &RateLimitPolicy,
    identifier: &str,
) -> Result<(), ApiError> {
    let result = state.limiter.check(identifier, policy).await;
    if result.success {
        return Ok(());
    }

    let retry_after_secs = result.retry_after_secs(state.limiter.now_ms());
    EventLogger::log(
        policy.name,
        RequestEvent::RateLimited {
            identifier: identifier.to_string(),
            limit: result.limit,
            retry_after_secs,
        },
    );
    Err(ApiError::RateLimited {
        result,
        retry_after_secs,
    })
}

/// Parse a JSON body and validate it against `T`.
pub(crate) fn parse_body<T: Schema>(endpoint: &str, body: &[u8]) -> Result<T, ApiError> {
    let value: Value = serde_json::from_slice(body).map_err(|e| {
        warn!(endpoint, error = %e, "Rejected malformed JSON body");
        ApiError::InvalidJson(e.to_string())
    })?;

    validate(&value).map_err(|errors| {
        EventLogger::log(
            endpoint,
            RequestEvent::ValidationRejected {
                fields: errors.fields(),
            },
        );
        ApiError::Validation(errors)
    })
}

/// Run a store call on the blocking pool.
pub(crate) async fn with_store<T, F>(state: &GatewayState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&dyn ContentStore) -> FolioResult<T> + Send + 'static,
    T: Send + 'static,
{
    let store = state.store.clone();
    tokio::task::spawn_blocking(move || f(store.as_ref()))
        .await
        .map_err(|e| ApiError::Internal(format!("store task failed: {e}")))?
        .map_err(ApiError::from)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use axum::{
        Router,
        body::Body,
        http::{Request, Response, header},
    };
    use serde_json::Value;
use uuid::Uuid;

    use folio_core::ManualClock;
    use folio_store::MemoryContentStore;

    use crate::rate_limit::{MemoryStore, RateLimiter};
    use crate::server::build_router;
    use crate::state::GatewayState;

    pub const START_MS: i64 = 1_700_000_000_000;

    pub fn state() -> (GatewayState, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(START_MS));
        let limiter = RateLimiter::in_memory(Arc::new(MemoryStore::new(1_000)), clock.clone());
        let state = GatewayState::new(Arc::new(MemoryContentStore::new()), Arc::new(limiter));
        (state, clock)
    }

    pub fn router(state: GatewayState) -> Router {
        build_router(state, &[])
    }

    pub fn post_json(uri: &str, ip: &str, body: &Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-forwarded-for", ip)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    pub fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    pub async fn body_json(response: Response<Body>) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }
}
