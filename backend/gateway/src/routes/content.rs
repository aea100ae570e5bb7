//! Public read-only content: projects, skills, and published posts.

use axum::{
    Json,
    extract::{Path, State},
};

use folio_core::{BlogPost, Project, Skill};

use crate::error::ApiError;
use crate::routes::with_store;
use crate::state::GatewayState;

pub async fn list_projects(State(state): State<GatewayState>) -> Result<Json<Vec<Project>>, ApiError> {
    with_store(&state, |store| store.list_projects()).await.map(Json)
}

pub async fn list_skills(State(state): State<GatewayState>) -> Result<Json<Vec<Skill>>, ApiError> {
    with_store(&state, |store| store.list_skills()).await.map(Json)
}

pub async fn list_posts(State(state): State<GatewayState>) -> Result<Json<Vec<BlogPost>>, ApiError> {
    with_store(&state, |store| store.list_posts(true)).await.map(Json)
}

/// Drafts are invisible here, even by exact slug.
pub async fn get_post(
    State(state): State<GatewayState>,
    Path(slug): Path<String>,
) -> Result<Json<BlogPost>, ApiError> {
    let lookup = slug.clone();
    let post = with_store(&state, move |store| store.get_post_by_slug(&lookup)).await?;
    match post {
        Some(post) if post.published => Ok(Json(post)),
        _ => Err(ApiError::NotFound(format!("No post with slug '{slug}'"))),
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use tower::ServiceExt;

    use folio_core::BlogPostDraft;

    use crate::routes::test_support::{body_json, get, router, state};

    fn draft(slug: &str, published: bool) -> BlogPostDraft {
        BlogPostDraft {
            title: slug.to_uppercase(),
            slug: slug.into(),
            excerpt: None,
            content: "Body".into(),
            tags: vec!["rust".into()],
            published,
        }
    }

    #[tokio::test]
    async fn only_published_posts_are_public() {
        let (state, _clock) = state();
        state.store.create_post(&draft("live", true)).unwrap();
        state.store.create_post(&draft("wip", false)).unwrap();
        let app = router(state);

        let list = app.clone().oneshot(get("/api/blog")).await.unwrap();
        let body = body_json(list).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["slug"], "live");

        let live = app.clone().oneshot(get("/api/blog/live")).await.unwrap();
        assert_eq!(live.status(), StatusCode::OK);

        let wip = app.oneshot(get("/api/blog/wip")).await.unwrap();
        assert_eq!(wip.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn empty_lists_are_ok() {
        let (state, _clock) = state();
        let app = router(state);
        for uri in ["/api/projects", "/api/skills"] {
            let response = app.clone().oneshot(get(uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(body_json(response).await, serde_json::json!([]));
        }
    }
}
