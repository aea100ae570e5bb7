pub mod clock;
pub mod error;
pub mod traits;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{FolioError, FolioResult};
pub use traits::{
    ActivitySource, ContentStore, LlmProvider, LlmRequest, LlmResponse, Mailer, OutboundEmail,
};
pub use types::{
    BlogPost, BlogPostDraft, ChatRole, ChatTurn, ContactMessage, GithubActivity, LanguageShare,
    NewContactMessage, NewSubscriber, Project, ProjectDraft, RepoSummary, Skill, SkillCategory,
    SkillDraft, Subscriber,
};
