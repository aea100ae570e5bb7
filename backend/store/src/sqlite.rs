use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use tracing::info;
use uuid::Uuid;

use folio_core::{
    BlogPost, BlogPostDraft, ContactMessage, ContentStore, FolioError, FolioResult,
    NewContactMessage, NewSubscriber, Project, ProjectDraft, Skill, SkillCategory, SkillDraft,
    Subscriber,
};

/// SQLite-backed content store.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create the store at the given path.
    pub fn open(path: &str) -> FolioResult<Self> {
        let conn = Connection::open(path).map_err(storage_err)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        info!(path = %path, "Content store opened");
        Ok(store)
    }

    /// Create an in-memory store (for testing).
    pub fn in_memory() -> FolioResult<Self> {
        let conn = Connection::open_in_memory().map_err(storage_err)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn conn(&self) -> FolioResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| FolioError::Storage("connection mutex poisoned".into()))
    }

    fn init_schema(&self) -> FolioResult<()> {
        self.conn()?
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS contacts (
                    id TEXT PRIMARY KEY,
                    name TEXT NOT NULL,
                    email TEXT NOT NULL,
                    subject TEXT NOT NULL,
                    message TEXT NOT NULL,
                    read INTEGER NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL
                );
                CREATE TABLE IF NOT EXISTS projects (
                    id TEXT PRIMARY KEY,
                    title TEXT NOT NULL,
                    description TEXT NOT NULL,
                    tech_stack TEXT NOT NULL,
                    github_url TEXT,
                    live_url TEXT,
                    image_url TEXT,
                    featured INTEGER NOT NULL DEFAULT 0,
                    sort_order INTEGER NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );
                CREATE TABLE IF NOT EXISTS skills (
                    id TEXT PRIMARY KEY,
                    name TEXT NOT NULL,
                    category TEXT NOT NULL,
                    proficiency INTEGER NOT NULL,
                    created_at TEXT NOT NULL
                );
                CREATE TABLE IF NOT EXISTS posts (
                    id TEXT PRIMARY KEY,
                    title TEXT NOT NULL,
                    slug TEXT NOT NULL UNIQUE,
                    excerpt TEXT,
                    content TEXT NOT NULL,
                    tags TEXT NOT NULL,
                    published INTEGER NOT NULL DEFAULT 0,
                    published_at TEXT,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );
                CREATE TABLE IF NOT EXISTS subscribers (
                    id TEXT PRIMARY KEY,
                    email TEXT NOT NULL UNIQUE,
                    name TEXT,
                    created_at TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_contacts_created ON contacts(created_at);
                CREATE INDEX IF NOT EXISTS idx_posts_published ON posts(published);",
            )
            .map_err(storage_err)
    }
}

const CONTACT_COLUMNS: &str = "id, name, email, subject, message, read, created_at";
const PROJECT_COLUMNS: &str = "id, title, description, tech_stack, github_url, live_url, image_url, featured, sort_order, created_at, updated_at";
const SKILL_COLUMNS: &str = "id, name, category, proficiency, created_at";
const POST_COLUMNS: &str =
    "id, title, slug, excerpt, content, tags, published, published_at, created_at, updated_at";
const SUBSCRIBER_COLUMNS: &str = "id, email, name, created_at";

fn storage_err(e: rusqlite::Error) -> FolioError {
    if let rusqlite::Error::SqliteFailure(inner, _) = &e {
        if inner.code == ErrorCode::ConstraintViolation {
            return FolioError::Conflict(e.to_string());
        }
    }
    FolioError::Storage(e.to_string())
}

fn conversion_err<E>(idx: usize, e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

fn uuid_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw).map_err(|e| conversion_err(idx, e))
}

fn time_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| conversion_err(idx, e))
}

fn opt_time_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| conversion_err(idx, e))
    })
    .transpose()
}

fn list_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Vec<String>> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| conversion_err(idx, e))
}

fn to_json_list(items: &[String]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}

fn contact_from_row(row: &Row<'_>) -> rusqlite::Result<ContactMessage> {
    Ok(ContactMessage {
        id: uuid_at(row, 0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        subject: row.get(3)?,
        message: row.get(4)?,
        read: row.get(5)?,
        created_at: time_at(row, 6)?,
    })
}

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: uuid_at(row, 0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        tech_stack: list_at(row, 3)?,
        github_url: row.get(4)?,
        live_url: row.get(5)?,
        image_url: row.get(6)?,
        featured: row.get(7)?,
        sort_order: row.get(8)?,
        created_at: time_at(row, 9)?,
        updated_at: time_at(row, 10)?,
    })
}

fn skill_from_row(row: &Row<'_>) -> rusqlite::Result<Skill> {
    let category: String = row.get(2)?;
    let category: SkillCategory = category.parse().map_err(|e: String| {
        rusqlite::Error::FromSqlConversionFailure(2, Type::Text, e.into())
    })?;
    Ok(Skill {
        id: uuid_at(row, 0)?,
        name: row.get(1)?,
        category,
        proficiency: row.get(3)?,
        created_at: time_at(row, 4)?,
    })
}

fn post_from_row(row: &Row<'_>) -> rusqlite::Result<BlogPost> {
    Ok(BlogPost {
        id: uuid_at(row, 0)?,
        title: row.get(1)?,
        slug: row.get(2)?,
        excerpt: row.get(3)?,
        content: row.get(4)?,
        tags: list_at(row, 5)?,
        published: row.get(6)?,
        published_at: opt_time_at(row, 7)?,
        created_at: time_at(row, 8)?,
        updated_at: time_at(row, 9)?,
    })
}

fn subscriber_from_row(row: &Row<'_>) -> rusqlite::Result<Subscriber> {
    Ok(Subscriber {
        id: uuid_at(row, 0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        created_at: time_at(row, 3)?,
    })
}

impl SqliteStore {
    fn query_all<T>(
        &self,
        sql: &str,
        map: impl FnMut(&Row<'_>) -> rusqlite::Result<T>,
    ) -> FolioResult<Vec<T>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql).map_err(storage_err)?;
        let rows = stmt.query_map([], map).map_err(storage_err)?;
        rows.collect::<rusqlite::Result<Vec<T>>>()
            .map_err(storage_err)
    }

    fn query_by_id<T>(
        conn: &Connection,
        sql: &str,
        id: Uuid,
        map: impl FnOnce(&Row<'_>) -> rusqlite::Result<T>,
    ) -> FolioResult<T> {
        conn.query_row(sql, params![id.to_string()], map)
            .optional()
            .map_err(storage_err)?
            .ok_or_else(|| FolioError::NotFound(id.to_string()))
    }

    fn delete_by_id(&self, table: &str, id: Uuid) -> FolioResult<()> {
        let changed = self
            .conn()?
            .execute(
                &format!("DELETE FROM {table} WHERE id = ?1"),
                params![id.to_string()],
            )
            .map_err(storage_err)?;
        if changed == 0 {
            return Err(FolioError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

impl ContentStore for SqliteStore {
    fn create_contact(&self, new: &NewContactMessage) -> FolioResult<ContactMessage> {
        let contact = ContactMessage {
            id: Uuid::new_v4(),
            name: new.name.clone(),
            email: new.email.clone(),
            subject: new.subject.clone(),
            message: new.message.clone(),
            read: false,
            created_at: Utc::now(),
        };
        self.conn()?
            .execute(
                "INSERT INTO contacts (id, name, email, subject, message, read, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)",
                params![
                    contact.id.to_string(),
                    contact.name,
                    contact.email,
                    contact.subject,
                    contact.message,
                    contact.created_at.to_rfc3339(),
                ],
            )
            .map_err(storage_err)?;
        Ok(contact)
    }

    fn list_contacts(&self) -> FolioResult<Vec<ContactMessage>> {
        self.query_all(
            &format!("SELECT {CONTACT_COLUMNS} FROM contacts ORDER BY created_at DESC"),
            contact_from_row,
        )
    }

    fn set_contact_read(&self, id: Uuid, read: bool) -> FolioResult<ContactMessage> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE contacts SET read = ?2 WHERE id = ?1",
            params![id.to_string(), read],
        )
        .map_err(storage_err)?;
        Self::query_by_id(
            &conn,
            &format!("SELECT {CONTACT_COLUMNS} FROM contacts WHERE id = ?1"),
            id,
            contact_from_row,
        )
    }

    fn delete_contact(&self, id: Uuid) -> FolioResult<()> {
        self.delete_by_id("contacts", id)
    }

    fn list_projects(&self) -> FolioResult<Vec<Project>> {
        self.query_all(
            &format!(
                "SELECT {PROJECT_COLUMNS} FROM projects ORDER BY featured DESC, sort_order ASC, created_at DESC"
            ),
            project_from_row,
        )
    }

    fn create_project(&self, draft: &ProjectDraft) -> FolioResult<Project> {
        let now = Utc::now();
        let id = Uuid::new_v4();
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO projects (id, title, description, tech_stack, github_url, live_url, image_url,
                                   featured, sort_order, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
            params![
                id.to_string(),
                draft.title,
                draft.description,
                to_json_list(&draft.tech_stack),
                draft.github_url,
                draft.live_url,
                draft.image_url,
                draft.featured,
                draft.sort_order,
                now.to_rfc3339(),
            ],
        )
        .map_err(storage_err)?;
        Self::query_by_id(
            &conn,
            &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1"),
            id,
            project_from_row,
        )
    }

    fn update_project(&self, id: Uuid, draft: &ProjectDraft) -> FolioResult<Project> {
        let conn = self.conn()?;
        let changed = conn
            .execute(
                "UPDATE projects SET title = ?2, description = ?3, tech_stack = ?4, github_url = ?5,
                        live_url = ?6, image_url = ?7, featured = ?8, sort_order = ?9, updated_at = ?10
                 WHERE id = ?1",
                params![
                    id.to_string(),
                    draft.title,
                    draft.description,
                    to_json_list(&draft.tech_stack),
                    draft.github_url,
                    draft.live_url,
                    draft.image_url,
                    draft.featured,
                    draft.sort_order,
                    Utc::now().to_rfc3339(),
                ],
            )
            .map_err(storage_err)?;
        if changed == 0 {
            return Err(FolioError::NotFound(id.to_string()));
        }
        Self::query_by_id(
            &conn,
            &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1"),
            id,
            project_from_row,
        )
    }

    fn delete_project(&self, id: Uuid) -> FolioResult<()> {
        self.delete_by_id("projects", id)
    }

    fn list_skills(&self) -> FolioResult<Vec<Skill>> {
        self.query_all(
            &format!("SELECT {SKILL_COLUMNS} FROM skills ORDER BY category ASC, proficiency DESC, name ASC"),
            skill_from_row,
        )
    }

    fn create_skill(&self, draft: &SkillDraft) -> FolioResult<Skill> {
        let skill = Skill {
            id: Uuid::new_v4(),
            name: draft.name.clone(),
            category: draft.category,
            proficiency: draft.proficiency,
            created_at: Utc::now(),
        };
        self.conn()?
            .execute(
                "INSERT INTO skills (id, name, category, proficiency, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    skill.id.to_string(),
                    skill.name,
                    skill.category.as_str(),
                    skill.proficiency,
                    skill.created_at.to_rfc3339(),
                ],
            )
            .map_err(storage_err)?;
        Ok(skill)
    }

    fn update_skill(&self, id: Uuid, draft: &SkillDraft) -> FolioResult<Skill> {
        let conn = self.conn()?;
        let changed = conn
            .execute(
                "UPDATE skills SET name = ?2, category = ?3, proficiency = ?4 WHERE id = ?1",
                params![
                    id.to_string(),
                    draft.name,
                    draft.category.as_str(),
                    draft.proficiency
                ],
            )
            .map_err(storage_err)?;
        if changed == 0 {
            return Err(FolioError::NotFound(id.to_string()));
        }
        Self::query_by_id(
            &conn,
            &format!("SELECT {SKILL_COLUMNS} FROM skills WHERE id = ?1"),
            id,
            skill_from_row,
        )
    }

    fn delete_skill(&self, id: Uuid) -> FolioResult<()> {
        self.delete_by_id("skills", id)
    }

    fn list_posts(&self, published_only: bool) -> FolioResult<Vec<BlogPost>> {
        let filter = if published_only { "WHERE published = 1" } else { "" };
        self.query_all(
            &format!(
                "SELECT {POST_COLUMNS} FROM posts {filter} ORDER BY COALESCE(published_at, created_at) DESC"
            ),
            post_from_row,
        )
    }

    fn get_post_by_slug(&self, slug: &str) -> FolioResult<Option<BlogPost>> {
        self.conn()?
            .query_row(
                &format!("SELECT {POST_COLUMNS} FROM posts WHERE slug = ?1"),
                params![slug],
                post_from_row,
            )
            .optional()
            .map_err(storage_err)
    }

    fn create_post(&self, draft: &BlogPostDraft) -> FolioResult<BlogPost> {
        let now = Utc::now();
        let id = Uuid::new_v4();
        let published_at = draft.published.then(|| now.to_rfc3339());
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO posts (id, title, slug, excerpt, content, tags, published, published_at,
                                created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
            params![
                id.to_string(),
                draft.title,
                draft.slug,
                draft.excerpt,
                draft.content,
                to_json_list(&draft.tags),
                draft.published,
                published_at,
                now.to_rfc3339(),
            ],
        )
        .map_err(storage_err)?;
        Self::query_by_id(
            &conn,
            &format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?1"),
            id,
            post_from_row,
        )
    }

    fn update_post(&self, id: Uuid, draft: &BlogPostDraft) -> FolioResult<BlogPost> {
        let now = Utc::now().to_rfc3339();
        let conn = self.conn()?;
        // First publication stamps published_at; unpublishing clears it.
        let changed = conn
            .execute(
                "UPDATE posts SET title = ?2, slug = ?3, excerpt = ?4, content = ?5, tags = ?6,
                        published = ?7,
                        published_at = CASE WHEN ?7 THEN COALESCE(published_at, ?8) ELSE NULL END,
                        updated_at = ?8
                 WHERE id = ?1",
                params![
                    id.to_string(),
                    draft.title,
                    draft.slug,
                    draft.excerpt,
                    draft.content,
                    to_json_list(&draft.tags),
                    draft.published,
                    now,
                ],
            )
            .map_err(storage_err)?;
        if changed == 0 {
            return Err(FolioError::NotFound(id.to_string()));
        }
        Self::query_by_id(
            &conn,
            &format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?1"),
            id,
            post_from_row,
        )
    }

    fn delete_post(&self, id: Uuid) -> FolioResult<()> {
        self.delete_by_id("posts", id)
    }

    fn add_subscriber(&self, new: &NewSubscriber) -> FolioResult<Subscriber> {
        let subscriber = Subscriber {
            id: Uuid::new_v4(),
            email: new.email.clone(),
            name: new.name.clone(),
            created_at: Utc::now(),
        };
        self.conn()?
            .execute(
                "INSERT INTO subscribers (id, email, name, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![
                    subscriber.id.to_string(),
                    subscriber.email,
                    subscriber.name,
                    subscriber.created_at.to_rfc3339(),
                ],
            )
            .map_err(|e| match storage_err(e) {
                FolioError::Conflict(_) => {
                    FolioError::Conflict(format!("{} is already subscribed", new.email))
                }
                other => other,
            })?;
        Ok(subscriber)
    }

    fn list_subscribers(&self) -> FolioResult<Vec<Subscriber>> {
        self.query_all(
            &format!("SELECT {SUBSCRIBER_COLUMNS} FROM subscribers ORDER BY created_at DESC"),
            subscriber_from_row,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project_draft(title: &str) -> ProjectDraft {
        ProjectDraft {
            title: title.to_string(),
            description: "A thing I built".to_string(),
            tech_stack: vec!["rust".to_string(), "axum".to_string()],
            github_url: Some("https://github.com/me/thing".to_string()),
            live_url: None,
            image_url: None,
            featured: false,
            sort_order: 0,
        }
    }

    fn post_draft(slug: &str, published: bool) -> BlogPostDraft {
        BlogPostDraft {
            title: "Hello".to_string(),
            slug: slug.to_string(),
            excerpt: None,
            content: "Body".to_string(),
            tags: vec!["rust".to_string()],
            published,
        }
    }

    #[test]
    fn contact_lifecycle() {
        let store = SqliteStore::in_memory().unwrap();
        let created = store
            .create_contact(&NewContactMessage {
                name: "Ada".into(),
                email: "ada@example.com".into(),
                subject: "Hello there".into(),
                message: "I would like to talk.".into(),
            })
            .unwrap();
        assert!(!created.read);

        let updated = store.set_contact_read(created.id, true).unwrap();
        assert!(updated.read);
        assert_eq!(store.list_contacts().unwrap().len(), 1);

        store.delete_contact(created.id).unwrap();
        assert!(store.list_contacts().unwrap().is_empty());
        assert!(matches!(
            store.delete_contact(created.id),
            Err(FolioError::NotFound(_))
        ));
    }

    #[test]
    fn project_update_round_trips_tech_stack() {
        let store = SqliteStore::in_memory().unwrap();
        let project = store.create_project(&project_draft("First")).unwrap();
        assert_eq!(project.tech_stack, vec!["rust", "axum"]);

        let mut draft = project_draft("Renamed");
        draft.featured = true;
        let updated = store.update_project(project.id, &draft).unwrap();
        assert_eq!(updated.title, "Renamed");
        assert!(updated.featured);

        assert!(matches!(
            store.update_project(Uuid::new_v4(), &draft),
            Err(FolioError::NotFound(_))
        ));
    }

    #[test]
    fn skills_keep_category() {
        let store = SqliteStore::in_memory().unwrap();
        let skill = store
            .create_skill(&SkillDraft {
                name: "Rust".into(),
                category: SkillCategory::Backend,
                proficiency: 90,
            })
            .unwrap();
        let listed = store.list_skills().unwrap();
        assert_eq!(listed, vec![skill]);
    }

    #[test]
    fn posts_filter_unpublished_and_stamp_publication() {
        let store = SqliteStore::in_memory().unwrap();
        let draft = store.create_post(&post_draft("draft-post", false)).unwrap();
        store.create_post(&post_draft("live-post", true)).unwrap();

        assert_eq!(store.list_posts(true).unwrap().len(), 1);
        assert_eq!(store.list_posts(false).unwrap().len(), 2);
        assert!(draft.published_at.is_none());

        let published = store
            .update_post(draft.id, &post_draft("draft-post", true))
            .unwrap();
        assert!(published.published_at.is_some());

        let found = store.get_post_by_slug("live-post").unwrap();
        assert!(found.is_some());
        assert!(store.get_post_by_slug("missing").unwrap().is_none());
    }

    #[test]
    fn duplicate_slug_is_conflict() {
        let store = SqliteStore::in_memory().unwrap();
        store.create_post(&post_draft("same", true)).unwrap();
        assert!(matches!(
            store.create_post(&post_draft("same", true)),
            Err(FolioError::Conflict(_))
        ));
    }

    #[test]
    fn duplicate_subscriber_is_conflict() {
        let store = SqliteStore::in_memory().unwrap();
        let new = NewSubscriber {
            email: "reader@example.com".into(),
            name: None,
        };
        store.add_subscriber(&new).unwrap();
        let err = store.add_subscriber(&new).unwrap_err();
        assert!(matches!(err, FolioError::Conflict(msg) if msg.contains("already subscribed")));
        assert_eq!(store.list_subscribers().unwrap().len(), 1);
    }
}
