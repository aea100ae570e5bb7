//! `GET /api/github/activity`, cached for the configured TTL.

use axum::{Json, extract::State};
use tracing::debug;

use folio_core::GithubActivity;
use folio_logging::{EventLogger, RequestEvent};

use crate::error::ApiError;
use crate::state::GatewayState;

const CACHE_KEY: &str = "activity";

pub async fn get_activity(
    State(state): State<GatewayState>,
) -> Result<Json<GithubActivity>, ApiError> {
    let Some(source) = &state.activity else {
        return Err(ApiError::NotFound("GitHub integration is not configured".into()));
    };

    if let Some(cached) = state.activity_cache.get(CACHE_KEY) {
        debug!("Serving cached GitHub activity");
        return Ok(Json(cached));
    }

    match source.fetch_activity().await {
        Ok(activity) => {
            state.activity_cache.insert(CACHE_KEY, activity.clone());
            Ok(Json(activity))
        }
        Err(e) => {
            EventLogger::log(
                "github",
                RequestEvent::CollaboratorFailed {
                    service: "github".into(),
                    error: e.to_string(),
                },
            );
            Err(ApiError::Internal(format!("GitHub fetch failed: {e}")))
        }
    }
}
