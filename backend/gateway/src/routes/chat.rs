//! `POST /api/chat`: the portfolio chatbot.

use axum::{Json, body::Bytes, extract::State};
use serde::Serialize;

use folio_assistant::ReplySource;
use folio_logging::{EventLogger, RequestEvent};

use crate::client_ip::ClientId;
use crate::error::ApiError;
use crate::rate_limit::RateLimitPolicy;
use crate::routes::{enforce_rate_limit, parse_body};
use crate::state::GatewayState;
use crate::validation::ChatRequest;

const ENDPOINT: &str = "chat";

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    /// True when the reply is canned rather than generated.
    pub fallback: bool,
}

pub async fn chat(
    State(state): State<GatewayState>,
    ClientId(client): ClientId,
    body: Bytes,
) -> Result<Json<ChatResponse>, ApiError> {
    enforce_rate_limit(&state, &RateLimitPolicy::CHAT, &client).await?;
    let request: ChatRequest = parse_body(ENDPOINT, &body)?;

    let reply = state
        .assistant
        .reply(&request.message, &request.conversation_history)
        .await;

    if let Some(error) = reply.failure {
        EventLogger::log(
            ENDPOINT,
            RequestEvent::CollaboratorFailed {
                service: "llm".into(),
                error,
            },
        );
    }

    Ok(Json(ChatResponse {
        response: reply.content,
        fallback: reply.source == ReplySource::Fallback,
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use serde_json::json;
    use tower::ServiceExt;

    use folio_assistant::Assistant;
    use folio_assistant::providers::MockProvider;

    use crate::error::{RATE_LIMIT_LIMIT, RATE_LIMIT_REMAINING, RATE_LIMIT_RESET};
    use crate::routes::test_support::{body_json, post_json, router, state};

    #[tokio::test]
    async fn eleventh_request_in_window_is_rejected() {
        let (state, clock) = state();
        let app = router(state);
        let payload = json!({"message": "Tell me about your projects"});

        for _ in 0..10 {
            let response = app
                .clone()
                .oneshot(post_json("/api/chat", "1.2.3.4", &payload))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            clock.advance_ms(200);
        }

        let response = app
            .clone()
            .oneshot(post_json("/api/chat", "1.2.3.4", &payload))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[RATE_LIMIT_LIMIT], "10");
        assert_eq!(response.headers()[RATE_LIMIT_REMAINING], "0");
        assert!(response.headers().contains_key(RATE_LIMIT_RESET));

        let body = body_json(response).await;
        // First request was at t0; now is t0 + 2s, so 8s remain.
        assert_eq!(body["retryAfter"], 8);

        // Another client is unaffected.
        let other = app
            .oneshot(post_json("/api/chat", "4.3.2.1", &payload))
            .await
            .unwrap();
        assert_eq!(other.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn provider_failure_returns_canned_reply() {
        let (state, _clock) = state();
        let provider = Arc::new(MockProvider::new("mock").failing("upstream 503"));
        let state = state.with_assistant(Assistant::new("Ada", "m").with_provider(provider));

        let response = router(state)
            .oneshot(post_json("/api/chat", "1.1.1.1", &json!({"message": "hello"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["fallback"], true);
        assert!(!body["response"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn generated_reply_is_not_flagged() {
        let (state, _clock) = state();
        let provider = Arc::new(MockProvider::new("mock").with_response("I write Rust."));
        let state = state.with_assistant(Assistant::new("Ada", "m").with_provider(provider));

        let response = router(state)
            .oneshot(post_json("/api/chat", "1.1.1.1", &json!({
                "message": "What do you do?",
                "conversationHistory": [{"role": "assistant", "content": "Hi!"}]
            })))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["response"], "I write Rust.");
        assert_eq!(body["fallback"], false);
    }

    #[tokio::test]
    async fn invalid_body_lists_field_errors() {
        let (state, _clock) = state();
        let response = router(state)
            .oneshot(post_json("/api/chat", "1.1.1.1", &json!({"message": ""})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Validation failed");
        assert_eq!(body["details"][0]["field"], "message");
    }
}
