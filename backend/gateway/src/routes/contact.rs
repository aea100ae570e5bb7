//! `POST /api/contact`: store the message, then notify the site owner.

use axum::{Json, body::Bytes, extract::State, http::StatusCode};
use serde_json::{Value, json};
use tracing::info;

use folio_core::NewContactMessage;
use folio_integrations::templates::contact_notification;
use folio_logging::{EventLogger, RequestEvent};

use crate::client_ip::ClientId;
use crate::error::ApiError;
use crate::rate_limit::RateLimitPolicy;
use crate::routes::{enforce_rate_limit, parse_body, with_store};
use crate::state::GatewayState;

const ENDPOINT: &str = "contact";

pub async fn submit_contact(
    State(state): State<GatewayState>,
    ClientId(client): ClientId,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    enforce_rate_limit(&state, &RateLimitPolicy::CONTACT, &client).await?;
    let form: NewContactMessage = parse_body(ENDPOINT, &body)?;

    let new = form.clone();
    let saved = with_store(&state, move |store| store.create_contact(&new)).await?;
    info!(id = %saved.id, "Stored contact message");

    // The message is already saved, so a failed notification is not the visitor's problem.
    if let Some(owner_email) = &state.site.owner_email {
        let email = contact_notification(owner_email, &form);
        if let Err(e) = state.mailer.send(&email).await {
            EventLogger::log(
                ENDPOINT,
                RequestEvent::CollaboratorFailed {
                    service: state.mailer.name().to_string(),
                    error: e.to_string(),
                },
            );
        }
    }

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Thanks for reaching out! I'll get back to you soon.",
            "id": saved.id,
        })),
    ))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::Result;
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use serde_json::json;
    use tower::ServiceExt;

    use folio_core::{Mailer, OutboundEmail};
    use folio_integrations::LogMailer;

    use crate::routes::test_support::{body_json, post_json, router, state};
    use crate::state::SiteInfo;

    struct BrokenMailer;

    #[async_trait]
    impl Mailer for BrokenMailer {
        fn name(&self) -> &str {
            "broken"
        }

        async fn send(&self, _email: &OutboundEmail) -> Result<()> {
            anyhow::bail!("smtp relay refused connection")
        }
    }

    fn site() -> SiteInfo {
        SiteInfo {
            owner_name: "Ada".into(),
            owner_email: Some("ada@example.com".into()),
        }
    }

    fn valid_form() -> serde_json::Value {
        json!({
            "name": "Grace Hopper",
            "email": " Grace@Navy.MIL ",
            "subject": "Speaking invitation",
            "message": "Would you give a talk at our meetup?"
        })
    }

    #[tokio::test]
    async fn stores_message_and_notifies_owner() {
        let (state, _clock) = state();
        let mailer = Arc::new(LogMailer::new());
        let state = state.with_site(site()).with_mailer(mailer.clone());
        let store = state.store.clone();

        let response = router(state)
            .oneshot(post_json("/api/contact", "5.6.7.8", &valid_form()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(body_json(response).await["success"], true);

        let contacts = store.list_contacts().unwrap();
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].email, "grace@navy.mil");

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "ada@example.com");
        assert_eq!(sent[0].reply_to.as_deref(), Some("grace@navy.mil"));
    }

    #[tokio::test]
    async fn mail_failure_still_succeeds() {
        let (state, _clock) = state();
        let state = state.with_site(site()).with_mailer(Arc::new(BrokenMailer));

        let response = router(state)
            .oneshot(post_json("/api/contact", "5.6.7.8", &valid_form()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn invalid_form_reports_every_field() {
        let (state, _clock) = state();
        let store = state.store.clone();
        let response = router(state)
            .oneshot(post_json(
                "/api/contact",
                "5.6.7.8",
                &json!({"name": "Al", "email": "bad-email", "subject": "Hi", "message": "short"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        let fields: Vec<_> = body["details"]
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["field"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(fields, vec!["email", "subject", "message"]);
        assert!(store.list_contacts().unwrap().is_empty());
    }

    #[tokio::test]
    async fn sixth_submission_in_a_minute_is_limited() {
        let (state, clock) = state();
        let app = router(state);

        for _ in 0..5 {
            let response = app
                .clone()
                .oneshot(post_json("/api/contact", "5.6.7.8", &valid_form()))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::CREATED);
        }

        let limited = app
            .clone()
            .oneshot(post_json("/api/contact", "5.6.7.8", &valid_form()))
            .await
            .unwrap();
        assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);

        clock.advance_ms(60_000);
        let after_window = app
            .oneshot(post_json("/api/contact", "5.6.7.8", &valid_form()))
            .await
            .unwrap();
        assert_eq!(after_window.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn rate_limit_is_checked_before_body_parsing() {
        let (state, _clock) = state();
        let app = router(state);
        for _ in 0..5 {
            app.clone()
                .oneshot(post_json("/api/contact", "9.9.9.9", &json!({})))
                .await
                .unwrap();
        }
        let response = app
            .oneshot(post_json("/api/contact", "9.9.9.9", &json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
