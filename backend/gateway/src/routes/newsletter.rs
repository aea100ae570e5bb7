//! `POST /api/newsletter`: subscribe and send a welcome email.

use axum::{Json, body::Bytes, extract::State, http::StatusCode};
use serde_json::{Value, json};
use tracing::info;

use folio_core::NewSubscriber;
use folio_integrations::templates::newsletter_welcome;
use folio_logging::{EventLogger, RequestEvent};

use crate::client_ip::ClientId;
use crate::error::ApiError;
use crate::rate_limit::RateLimitPolicy;
use crate::routes::{enforce_rate_limit, parse_body, with_store};
use crate::state::GatewayState;

const ENDPOINT: &str = "newsletter";

pub async fn subscribe(
    State(state): State<GatewayState>,
    ClientId(client): ClientId,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    enforce_rate_limit(&state, &RateLimitPolicy::NEWSLETTER, &client).await?;
    let signup: NewSubscriber = parse_body(ENDPOINT, &body)?;

    let subscriber = with_store(&state, move |store| store.add_subscriber(&signup))
        .await
        .map_err(|e| match e {
            ApiError::Conflict(_) => ApiError::Conflict("This email is already subscribed".into()),
            other => other,
        })?;
    info!(id = %subscriber.id, "New newsletter subscriber");

    let email = newsletter_welcome(
        &state.site.owner_name,
        &subscriber.email,
        subscriber.name.as_deref(),
    );
    if let Err(e) = state.mailer.send(&email).await {
        EventLogger::log(
            ENDPOINT,
            RequestEvent::CollaboratorFailed {
                service: state.mailer.name().to_string(),
                error: e.to_string(),
            },
        );
    }

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "You're subscribed! Check your inbox for a welcome email.",
        })),
    ))
}
