use once_cell::sync::Lazy;
use regex::Regex;

use folio_core::{
    BlogPostDraft, ChatRole, ChatTurn, NewContactMessage, NewSubscriber, ProjectDraft,
    SkillCategory, SkillDraft,
};

use super::{Object, Report, Schema, Text};

static NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\p{L}\s\-'.]+$").unwrap());
static SLUG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9-]+$").unwrap());

const NAME_MESSAGE: &str = "Name can only contain letters, spaces, hyphens, apostrophes, and periods";

fn email_rule() -> Text {
    Text::new("Email").trimmed().lowercase().chars(1, 254).email()
}

fn person_name_rule() -> Text {
    Text::new("Name")
        .trimmed()
        .chars(2, 100)
        .pattern(&NAME_RE, NAME_MESSAGE)
}

/// `POST /api/chat` body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub message: String,
    pub conversation_history: Vec<ChatTurn>,
}

impl Schema for ChatRequest {
    fn parse(object: &Object<'_>, report: &mut Report) -> Option<Self> {
        let message = object.string("message", &Text::new("Message").trimmed().chars(1, 1000), report);
        let history = object.object_list("conversationHistory", "Conversation history", 20, report, |turn, report| {
            let role = turn.one_of("role", &["user", "assistant"], report);
            let content = turn.string("content", &Text::new("Content").chars(0, 2000), report);
            let role = match role?.as_str() {
                "assistant" => ChatRole::Assistant,
                _ => ChatRole::User,
            };
            Some(ChatTurn::new(role, content?))
        });

        Some(Self {
            message: message?,
            conversation_history: history?,
        })
    }
}

impl Schema for NewContactMessage {
    fn parse(object: &Object<'_>, report: &mut Report) -> Option<Self> {
        let name = object.string("name", &person_name_rule(), report);
        let email = object.string("email", &email_rule(), report);
        let subject = object.string("subject", &Text::new("Subject").trimmed().chars(5, 200), report);
        let message = object.string("message", &Text::new("Message").trimmed().chars(10, 5000), report);

        Some(Self {
            name: name?,
            email: email?,
            subject: subject?,
            message: message?,
        })
    }
}

impl Schema for NewSubscriber {
    fn parse(object: &Object<'_>, report: &mut Report) -> Option<Self> {
        let email = object.string("email", &email_rule(), report);
        let name = object.optional_string("name", &Text::new("Name").trimmed().chars(2, 100), report);

        Some(Self {
            email: email?,
            name: name?,
        })
    }
}

impl Schema for ProjectDraft {
    fn parse(object: &Object<'_>, report: &mut Report) -> Option<Self> {
        let title = object.string("title", &Text::new("Title").trimmed().chars(1, 200), report);
        let description = object.string(
            "description",
            &Text::new("Description").trimmed().chars(1, 2000),
            report,
        );
        let tech_stack = object.string_list(
            "techStack",
            "Tech stack",
            20,
            &Text::new("Technology").trimmed().chars(1, 50),
            report,
        );
        let github_url = object.optional_string("githubUrl", &Text::new("GitHub URL").trimmed().url(), report);
        let live_url = object.optional_string("liveUrl", &Text::new("Live URL").trimmed().url(), report);
        let image_url = object.optional_string("imageUrl", &Text::new("Image URL").trimmed().url(), report);
        let featured = object.boolean_or("featured", false, report);
        let sort_order = object.integer("sortOrder", "Sort order", 0, i64::from(i32::MAX), Some(0), report);

        Some(Self {
            title: title?,
            description: description?,
            tech_stack: tech_stack?,
            github_url: github_url?,
            live_url: live_url?,
            image_url: image_url?,
            featured: featured?,
            sort_order: sort_order?,
        })
    }
}

impl Schema for SkillDraft {
    fn parse(object: &Object<'_>, report: &mut Report) -> Option<Self> {
        let name = object.string("name", &Text::new("Name").trimmed().chars(1, 100), report);
        let categories: Vec<&str> = SkillCategory::ALL.iter().map(|c| c.as_str()).collect();
        let category = object.one_of("category", &categories, report);
        let proficiency = object.integer("proficiency", "Proficiency", 1, 100, None, report);

        Some(Self {
            name: name?,
            category: category?.parse().ok()?,
            proficiency: u8::try_from(proficiency?).ok()?,
        })
    }
}

impl Schema for BlogPostDraft {
    fn parse(object: &Object<'_>, report: &mut Report) -> Option<Self> {
        let title = object.string("title", &Text::new("Title").trimmed().chars(1, 200), report);
        let slug = object.string(
            "slug",
            &Text::new("Slug")
                .trimmed()
                .chars(1, 200)
                .pattern(&SLUG_RE, "Slug may only contain lowercase letters, numbers, and hyphens"),
            report,
        );
        let excerpt = object.optional_string("excerpt", &Text::new("Excerpt").trimmed().chars(0, 500), report);
        let content = object.string("content", &Text::new("Content").chars(1, 50_000), report);
        let tags = object.string_list("tags", "Tags", 10, &Text::new("Tag").trimmed().chars(1, 50), report);
        let published = object.boolean_or("published", false, report);

        Some(Self {
            title: title?,
            slug: slug?,
            excerpt: excerpt?,
            content: content?,
            tags: tags?,
            published: published?,
        })
    }
}

/// `POST /api/auth/login` body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl Schema for LoginRequest {
    fn parse(object: &Object<'_>, report: &mut Report) -> Option<Self> {
        let email = object.string("email", &email_rule(), report);
        let password = object.string("password", &Text::new("Password").chars(1, 200), report);

        Some(Self {
            email: email?,
            password: password?,
        })
    }
}

/// `PATCH /api/admin/contacts/:id` body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactStatusUpdate {
    pub read: bool,
}

impl Schema for ContactStatusUpdate {
    fn parse(object: &Object<'_>, report: &mut Report) -> Option<Self> {
        let read = object.boolean("read", report);
        Some(Self { read: read? })
    }
}
