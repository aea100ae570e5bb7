//! Admin CRUD. Every handler requires a live admin session.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::StatusCode,
};
use tracing::info;

use folio_core::{
    BlogPost, BlogPostDraft, ContactMessage, Project, ProjectDraft, Skill, SkillDraft, Subscriber,
};

use crate::auth::RequireAdmin;
use crate::error::ApiError;
use crate::routes::{EntityId, parse_body, with_store};
use crate::state::GatewayState;
use crate::validation::ContactStatusUpdate;

type Created<T> = (StatusCode, Json<T>);

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

pub async fn list_projects(
    State(state): State<GatewayState>,
    _admin: RequireAdmin,
) -> Result<Json<Vec<Project>>, ApiError> {
    with_store(&state, |store| store.list_projects()).await.map(Json)
}

pub async fn create_project(
    State(state): State<GatewayState>,
    _admin: RequireAdmin,
    body: Bytes,
) -> Result<Created<Project>, ApiError> {
    let draft: ProjectDraft = parse_body("admin.projects", &body)?;
    let project = with_store(&state, move |store| store.create_project(&draft)).await?;
    info!(id = %project.id, "Created project");
    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn update_project(
    State(state): State<GatewayState>,
    _admin: RequireAdmin,
    EntityId(id): EntityId,
    body: Bytes,
) -> Result<Json<Project>, ApiError> {
    let draft: ProjectDraft = parse_body("admin.projects", &body)?;
    with_store(&state, move |store| store.update_project(id, &draft))
        .await
        .map(Json)
}

pub async fn delete_project(
    State(state): State<GatewayState>,
    _admin: RequireAdmin,
    EntityId(id): EntityId,
) -> Result<StatusCode, ApiError> {
    with_store(&state, move |store| store.delete_project(id)).await?;
    info!(id = %id, "Deleted project");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Skills
// ---------------------------------------------------------------------------

pub async fn list_skills(
    State(state): State<GatewayState>,
    _admin: RequireAdmin,
) -> Result<Json<Vec<Skill>>, ApiError> {
    with_store(&state, |store| store.list_skills()).await.map(Json)
}

pub async fn create_skill(
    State(state): State<GatewayState>,
    _admin: RequireAdmin,
    body: Bytes,
) -> Result<Created<Skill>, ApiError> {
    let draft: SkillDraft = parse_body("admin.skills", &body)?;
    let skill = with_store(&state, move |store| store.create_skill(&draft)).await?;
    Ok((StatusCode::CREATED, Json(skill)))
}

pub async fn update_skill(
    State(state): State<GatewayState>,
    _admin: RequireAdmin,
    EntityId(id): EntityId,
    body: Bytes,
) -> Result<Json<Skill>, ApiError> {
    let draft: SkillDraft = parse_body("admin.skills", &body)?;
    with_store(&state, move |store| store.update_skill(id, &draft))
        .await
        .map(Json)
}

pub async fn delete_skill(
    State(state): State<GatewayState>,
    _admin: RequireAdmin,
    EntityId(id): EntityId,
) -> Result<StatusCode, ApiError> {
    with_store(&state, move |store| store.delete_skill(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Blog posts
// ---------------------------------------------------------------------------

/// All posts, drafts included.
pub async fn list_posts(
    State(state): State<GatewayState>,
    _admin: RequireAdmin,
) -> Result<Json<Vec<BlogPost>>, ApiError> {
    with_store(&state, |store| store.list_posts(false)).await.map(Json)
}

pub async fn create_post(
    State(state): State<GatewayState>,
    _admin: RequireAdmin,
    body: Bytes,
) -> Result<Created<BlogPost>, ApiError> {
    let draft: BlogPostDraft = parse_body("admin.posts", &body)?;
    let post = with_store(&state, move |store| store.create_post(&draft)).await?;
    info!(id = %post.id, slug = %post.slug, published = post.published, "Created post");
    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn update_post(
    State(state): State<GatewayState>,
    _admin: RequireAdmin,
    EntityId(id): EntityId,
    body: Bytes,
) -> Result<Json<BlogPost>, ApiError> {
    let draft: BlogPostDraft = parse_body("admin.posts", &body)?;
    with_store(&state, move |store| store.update_post(id, &draft))
        .await
        .map(Json)
}

pub async fn delete_post(
    State(state): State<GatewayState>,
    _admin: RequireAdmin,
    EntityId(id): EntityId,
) -> Result<StatusCode, ApiError> {
    with_store(&state, move |store| store.delete_post(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Contacts & subscribers
// ---------------------------------------------------------------------------

pub async fn list_contacts(
    State(state): State<GatewayState>,
    _admin: RequireAdmin,
) -> Result<Json<Vec<ContactMessage>>, ApiError> {
    with_store(&state, |store| store.list_contacts()).await.map(Json)
}

pub async fn update_contact(
    State(state): State<GatewayState>,
    _admin: RequireAdmin,
    EntityId(id): EntityId,
    body: Bytes,
) -> Result<Json<ContactMessage>, ApiError> {
    let update: ContactStatusUpdate = parse_body("admin.contacts", &body)?;
    with_store(&state, move |store| store.set_contact_read(id, update.read))
        .await
        .map(Json)
}

pub async fn delete_contact(
    State(state): State<GatewayState>,
    _admin: RequireAdmin,
    EntityId(id): EntityId,
) -> Result<StatusCode, ApiError> {
    with_store(&state, move |store| store.delete_contact(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_subscribers(
    State(state): State<GatewayState>,
    _admin: RequireAdmin,
) -> Result<Json<Vec<Subscriber>>, ApiError> {
    with_store(&state, |store| store.list_subscribers()).await.map(Json)
}
