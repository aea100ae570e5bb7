use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::error::FolioResult;
use crate::types::{
    BlogPost, BlogPostDraft, ChatTurn, ContactMessage, GithubActivity, NewContactMessage,
    NewSubscriber, Project, ProjectDraft, Skill, SkillDraft, Subscriber,
};

/// Persistence collaborator for everything the admin dashboard manages.
///
/// Calls are synchronous; implementations guard their own connection state.
pub trait ContentStore: Send + Sync {
    fn create_contact(&self, new: &NewContactMessage) -> FolioResult<ContactMessage>;
    fn list_contacts(&self) -> FolioResult<Vec<ContactMessage>>;
    fn set_contact_read(&self, id: Uuid, read: bool) -> FolioResult<ContactMessage>;
    fn delete_contact(&self, id: Uuid) -> FolioResult<()>;

    fn list_projects(&self) -> FolioResult<Vec<Project>>;
    fn create_project(&self, draft: &ProjectDraft) -> FolioResult<Project>;
    fn update_project(&self, id: Uuid, draft: &ProjectDraft) -> FolioResult<Project>;
    fn delete_project(&self, id: Uuid) -> FolioResult<()>;

    fn list_skills(&self) -> FolioResult<Vec<Skill>>;
    fn create_skill(&self, draft: &SkillDraft) -> FolioResult<Skill>;
    fn update_skill(&self, id: Uuid, draft: &SkillDraft) -> FolioResult<Skill>;
    fn delete_skill(&self, id: Uuid) -> FolioResult<()>;

    fn list_posts(&self, published_only: bool) -> FolioResult<Vec<BlogPost>>;
    fn get_post_by_slug(&self, slug: &str) -> FolioResult<Option<BlogPost>>;
    fn create_post(&self, draft: &BlogPostDraft) -> FolioResult<BlogPost>;
    fn update_post(&self, id: Uuid, draft: &BlogPostDraft) -> FolioResult<BlogPost>;
    fn delete_post(&self, id: Uuid) -> FolioResult<()>;

    /// Fails with `FolioError::Conflict` when the email is already subscribed.
    fn add_subscriber(&self, new: &NewSubscriber) -> FolioResult<Subscriber>;
    fn list_subscribers(&self) -> FolioResult<Vec<Subscriber>>;
}

/// An email ready to hand to a delivery service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub reply_to: Option<String>,
}

/// Email delivery collaborator.
#[async_trait]
pub trait Mailer: Send + Sync {
    fn name(&self) -> &str;

    async fn send(&self, email: &OutboundEmail) -> Result<()>;
}

/// Trait for LLM completion providers used by the chatbot.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name (e.g., "groq", "mock").
    fn name(&self) -> &str;

    /// Send a completion request and return the response text.
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse>;
}

/// Request to an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub model: String,
    pub system_prompt: String,
    /// Prior turns followed by the new user message, oldest first.
    pub messages: Vec<ChatTurn>,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Response from an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub provider: String,
    pub model: String,
    pub tokens_used: u64,
    pub latency_ms: u64,
}

/// Source-control hosting collaborator.
#[async_trait]
pub trait ActivitySource: Send + Sync {
    async fn fetch_activity(&self) -> Result<GithubActivity>;
}
