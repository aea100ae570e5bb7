//! Admin login and logout.

use axum::{Json, body::Bytes, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::auth::RequireAdmin;
use crate::client_ip::ClientId;
use crate::error::ApiError;
use crate::rate_limit::RateLimitPolicy;
use crate::routes::{enforce_rate_limit, parse_body};
use crate::state::GatewayState;
use crate::validation::LoginRequest;

const ENDPOINT: &str = "login";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// `POST /api/auth/login`
pub async fn login(
    State(state): State<GatewayState>,
    ClientId(client): ClientId,
    body: Bytes,
) -> Result<Json<LoginResponse>, ApiError> {
    enforce_rate_limit(&state, &RateLimitPolicy::LOGIN, &client).await?;
    let request: LoginRequest = parse_body(ENDPOINT, &body)?;

    let Some(admin) = state.admin.clone() else {
        warn!("Login attempted but no admin account is configured");
        return Err(ApiError::Unauthorized);
    };

    let session_ttl = admin.session_ttl();
    let (email, password) = (request.email.clone(), request.password);
    let verified = tokio::task::spawn_blocking(move || admin.verify(&email, &password))
        .await
        .map_err(|e| ApiError::Internal(format!("password check failed: {e}")))?;
    if !verified {
        warn!(client = %client, "Rejected admin login");
        return Err(ApiError::Unauthorized);
    }

    let session = state.sessions.create(&request.email, session_ttl).await;
    info!(expires_at = %session.expires_at, "Admin logged in");
    Ok(Json(LoginResponse {
        token: session.token,
        expires_at: session.expires_at,
    }))
}

/// `POST /api/auth/logout`
pub async fn logout(
    State(state): State<GatewayState>,
    RequireAdmin(session): RequireAdmin,
) -> StatusCode {
    state.sessions.revoke(&session.token).await;
    StatusCode::NO_CONTENT
}
