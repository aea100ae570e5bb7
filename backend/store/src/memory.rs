//! In-memory content store for tests and throwaway local runs.

use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use uuid::Uuid;

use folio_core::{
    BlogPost, BlogPostDraft, ContactMessage, ContentStore, FolioError, FolioResult,
    NewContactMessage, NewSubscriber, Project, ProjectDraft, Skill, SkillDraft, Subscriber,
};

#[derive(Default)]
struct State {
    contacts: Vec<ContactMessage>,
    projects: Vec<Project>,
    skills: Vec<Skill>,
    posts: Vec<BlogPost>,
    subscribers: Vec<Subscriber>,
}

#[derive(Default)]
pub struct MemoryContentStore {
    state: Mutex<State>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> FolioResult<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| FolioError::Storage("state mutex poisoned".into()))
    }
}

fn find_mut<T>(items: &mut [T], id: Uuid, key: impl Fn(&T) -> Uuid) -> FolioResult<&mut T> {
    items
        .iter_mut()
        .find(|item| key(item) == id)
        .ok_or_else(|| FolioError::NotFound(id.to_string()))
}

fn remove<T>(items: &mut Vec<T>, id: Uuid, key: impl Fn(&T) -> Uuid) -> FolioResult<()> {
    let before = items.len();
    items.retain(|item| key(item) != id);
    if items.len() == before {
        return Err(FolioError::NotFound(id.to_string()));
    }
    Ok(())
}

impl ContentStore for MemoryContentStore {
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
        self.state()?.contacts.push(contact.clone());
        Ok(contact)
    }

    fn list_contacts(&self) -> FolioResult<Vec<ContactMessage>> {
        let mut contacts = self.state()?.contacts.clone();
        contacts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(contacts)
    }

    fn set_contact_read(&self, id: Uuid, read: bool) -> FolioResult<ContactMessage> {
        let mut state = self.state()?;
        let contact = find_mut(&mut state.contacts, id, |c| c.id)?;
        contact.read = read;
        Ok(contact.clone())
    }

    fn delete_contact(&self, id: Uuid) -> FolioResult<()> {
        remove(&mut self.state()?.contacts, id, |c| c.id)
    }

    fn list_projects(&self) -> FolioResult<Vec<Project>> {
        let mut projects = self.state()?.projects.clone();
        projects.sort_by(|a, b| {
            b.featured
                .cmp(&a.featured)
                .then(a.sort_order.cmp(&b.sort_order))
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(projects)
    }

    fn create_project(&self, draft: &ProjectDraft) -> FolioResult<Project> {
        let now = Utc::now();
        let project = Project {
            id: Uuid::new_v4(),
            title: draft.title.clone(),
            description: draft.description.clone(),
            tech_stack: draft.tech_stack.clone(),
            github_url: draft.github_url.clone(),
            live_url: draft.live_url.clone(),
            image_url: draft.image_url.clone(),
            featured: draft.featured,
            sort_order: draft.sort_order,
            created_at: now,
            updated_at: now,
        };
        self.state()?.projects.push(project.clone());
        Ok(project)
    }

    fn update_project(&self, id: Uuid, draft: &ProjectDraft) -> FolioResult<Project> {
        let mut state = self.state()?;
        let project = find_mut(&mut state.projects, id, |p| p.id)?;
        project.title = draft.title.clone();
        project.description = draft.description.clone();
        project.tech_stack = draft.tech_stack.clone();
        project.github_url = draft.github_url.clone();
        project.live_url = draft.live_url.clone();
        project.image_url = draft.image_url.clone();
        project.featured = draft.featured;
        project.sort_order = draft.sort_order;
        project.updated_at = Utc::now();
        Ok(project.clone())
    }

    fn delete_project(&self, id: Uuid) -> FolioResult<()> {
        remove(&mut self.state()?.projects, id, |p| p.id)
    }

    fn list_skills(&self) -> FolioResult<Vec<Skill>> {
        let mut skills = self.state()?.skills.clone();
        skills.sort_by(|a, b| {
            a.category
                .as_str()
                .cmp(b.category.as_str())
                .then(b.proficiency.cmp(&a.proficiency))
                .then(a.name.cmp(&b.name))
        });
        Ok(skills)
    }

    fn create_skill(&self, draft: &SkillDraft) -> FolioResult<Skill> {
        let skill = Skill {
            id: Uuid::new_v4(),
            name: draft.name.clone(),
            category: draft.category,
            proficiency: draft.proficiency,
            created_at: Utc::now(),
        };
        self.state()?.skills.push(skill.clone());
        Ok(skill)
    }

    fn update_skill(&self, id: Uuid, draft: &SkillDraft) -> FolioResult<Skill> {
        let mut state = self.state()?;
        let skill = find_mut(&mut state.skills, id, |s| s.id)?;
        skill.name = draft.name.clone();
        skill.category = draft.category;
        skill.proficiency = draft.proficiency;
        Ok(skill.clone())
    }

    fn delete_skill(&self, id: Uuid) -> FolioResult<()> {
        remove(&mut self.state()?.skills, id, |s| s.id)
    }

    fn list_posts(&self, published_only: bool) -> FolioResult<Vec<BlogPost>> {
        let mut posts: Vec<BlogPost> = self
            .state()?
            .posts
            .iter()
            .filter(|p| !published_only || p.published)
            .cloned()
            .collect();
        posts.sort_by(|a, b| {
            let a_key = a.published_at.unwrap_or(a.created_at);
            let b_key = b.published_at.unwrap_or(b.created_at);
            b_key.cmp(&a_key)
        });
        Ok(posts)
    }

    fn get_post_by_slug(&self, slug: &str) -> FolioResult<Option<BlogPost>> {
        Ok(self.state()?.posts.iter().find(|p| p.slug == slug).cloned())
    }

    fn create_post(&self, draft: &BlogPostDraft) -> FolioResult<BlogPost> {
        let mut state = self.state()?;
        if state.posts.iter().any(|p| p.slug == draft.slug) {
            return Err(FolioError::Conflict(format!("slug '{}' is taken", draft.slug)));
        }
        let now = Utc::now();
        let post = BlogPost {
            id: Uuid::new_v4(),
            title: draft.title.clone(),
            slug: draft.slug.clone(),
            excerpt: draft.excerpt.clone(),
            content: draft.content.clone(),
            tags: draft.tags.clone(),
            published: draft.published,
            published_at: draft.published.then_some(now),
            created_at: now,
            updated_at: now,
        };
        state.posts.push(post.clone());
        Ok(post)
    }

    fn update_post(&self, id: Uuid, draft: &BlogPostDraft) -> FolioResult<BlogPost> {
        let mut state = self.state()?;
        if state.posts.iter().any(|p| p.slug == draft.slug && p.id != id) {
            return Err(FolioError::Conflict(format!("slug '{}' is taken", draft.slug)));
        }
        let now = Utc::now();
        let post = find_mut(&mut state.posts, id, |p| p.id)?;
        post.title = draft.title.clone();
        post.slug = draft.slug.clone();
        post.excerpt = draft.excerpt.clone();
        post.content = draft.content.clone();
        post.tags = draft.tags.clone();
        post.published = draft.published;
        post.published_at = if draft.published {
            post.published_at.or(Some(now))
        } else {
            None
        };
        post.updated_at = now;
        Ok(post.clone())
    }

    fn delete_post(&self, id: Uuid) -> FolioResult<()> {
        remove(&mut self.state()?.posts, id, |p| p.id)
    }

    fn add_subscriber(&self, new: &NewSubscriber) -> FolioResult<Subscriber> {
        let mut state = self.state()?;
        if state.subscribers.iter().any(|s| s.email == new.email) {
            return Err(FolioError::Conflict(format!(
                "{} is already subscribed",
                new.email
            )));
        }
        let subscriber = Subscriber {
            id: Uuid::new_v4(),
            email: new.email.clone(),
            name: new.name.clone(),
            created_at: Utc::now(),
        };
        state.subscribers.push(subscriber.clone());
        Ok(subscriber)
    }

    fn list_subscribers(&self) -> FolioResult<Vec<Subscriber>> {
        Ok(self.state()?.subscribers.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::SkillCategory;

    #[test]
    fn featured_projects_sort_first() {
        let store = MemoryContentStore::new();
        let draft = |title: &str, featured: bool| ProjectDraft {
            title: title.into(),
            description: "d".into(),
            tech_stack: vec![],
            github_url: None,
            live_url: None,
            image_url: None,
            featured,
            sort_order: 0,
        };
        store.create_project(&draft("plain", false)).unwrap();
        store.create_project(&draft("star", true)).unwrap();
        let titles: Vec<_> = store
            .list_projects()
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(titles, vec!["star", "plain"]);
    }

    #[test]
    fn update_missing_skill_is_not_found() {
        let store = MemoryContentStore::new();
        let draft = SkillDraft {
            name: "Go".into(),
            category: SkillCategory::Backend,
            proficiency: 50,
        };
        assert!(matches!(
            store.update_skill(Uuid::new_v4(), &draft),
            Err(FolioError::NotFound(_))
        ));
    }

    #[test]
    fn duplicate_subscriber_is_conflict() {
        let store = MemoryContentStore::new();
        let new = NewSubscriber {
            email: "a@b.com".into(),
            name: None,
        };
        store.add_subscriber(&new).unwrap();
        assert!(matches!(
            store.add_subscriber(&new),
            Err(FolioError::Conflict(_))
        ));
    }
}
