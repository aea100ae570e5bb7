use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use folio_core::{ActivitySource, GithubActivity, LanguageShare, RepoSummary};

const TOP_LANGUAGES: usize = 5;
const RECENT_REPOS: usize = 6;

/// Read-only client for a user's public GitHub profile.
pub struct GithubClient {
    client: Client,
    username: String,
    token: Option<String>,
    api_url: String,
}

#[derive(Debug, Deserialize)]
struct UserPayload {
    login: String,
    public_repos: u32,
    followers: u32,
}

#[derive(Debug, Deserialize)]
struct RepoPayload {
    name: String,
    description: Option<String>,
    html_url: String,
    language: Option<String>,
    stargazers_count: u64,
    forks_count: u64,
    pushed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    fork: bool,
}

impl GithubClient {
    pub fn new(username: impl Into<String>, token: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(concat!("folio/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build GitHub HTTP client")?;
        Ok(Self {
            client,
            username: username.into(),
            token,
            api_url: "https://api.github.com".to_string(),
        })
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn get(&self, path: &str) -> RequestBuilder {
        let request = self
            .client
            .get(format!("{}{}", self.api_url, path))
            .header("Accept", "application/vnd.github+json");
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .get(path)
            .send()
            .await
            .with_context(|| format!("GitHub request to {} failed", path))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("GitHub returned {} for {}: {}", status, path, body);
        }
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse GitHub response for {}", path))
    }
}

#[async_trait]
impl ActivitySource for GithubClient {
    async fn fetch_activity(&self) -> Result<GithubActivity> {
        let user_path = format!("/users/{}", urlencoding::encode(&self.username));
        let user: UserPayload = self.fetch(&user_path).await?;
        let repos: Vec<RepoPayload> = self
            .fetch(&format!("{}/repos?sort=pushed&per_page=100", user_path))
            .await?;
        debug!(user = %user.login, repos = repos.len(), "Fetched GitHub activity");
        Ok(summarize(user, repos, Utc::now()))
    }
}

fn summarize(user: UserPayload, repos: Vec<RepoPayload>, now: DateTime<Utc>) -> GithubActivity {
    let own: Vec<RepoPayload> = repos.into_iter().filter(|r| !r.fork).collect();
    let total_stars = own.iter().map(|r| r.stargazers_count).sum();

    let mut counts: HashMap<&str, u32> = HashMap::new();
    for language in own.iter().filter_map(|r| r.language.as_deref()) {
        *counts.entry(language).or_insert(0) += 1;
    }
    let mut top_languages: Vec<LanguageShare> = counts
        .into_iter()
        .map(|(language, repos)| LanguageShare {
            language: language.to_string(),
            repos,
        })
        .collect();
    top_languages.sort_by(|a, b| b.repos.cmp(&a.repos).then(a.language.cmp(&b.language)));
    top_languages.truncate(TOP_LANGUAGES);

    let mut recent: Vec<&RepoPayload> = own.iter().collect();
    recent.sort_by(|a, b| b.pushed_at.cmp(&a.pushed_at));
    let recent_repos = recent
        .into_iter()
        .take(RECENT_REPOS)
        .map(|r| RepoSummary {
            name: r.name.clone(),
            description: r.description.clone(),
            url: r.html_url.clone(),
            language: r.language.clone(),
            stars: r.stargazers_count,
            forks: r.forks_count,
            pushed_at: r.pushed_at,
        })
        .collect();

    GithubActivity {
        username: user.login,
        public_repos: user.public_repos,
        followers: user.followers,
        total_stars,
        top_languages,
        recent_repos,
        fetched_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn repo(name: &str, language: Option<&str>, stars: u64, day: u32, fork: bool) -> RepoPayload {
        RepoPayload {
            name: name.into(),
            description: None,
            html_url: format!("https://github.com/ada/{name}"),
            language: language.map(String::from),
            stargazers_count: stars,
            forks_count: 0,
            pushed_at: Some(Utc.with_ymd_and_hms(2026, 1, day, 0, 0, 0).unwrap()),
            fork,
        }
    }

    #[test]
    fn summary_ignores_forks_and_ranks_languages() {
        let user = UserPayload {
            login: "ada".into(),
            public_repos: 4,
            followers: 7,
        };
        let repos = vec![
            repo("a", Some("Rust"), 10, 1, false),
            repo("b", Some("Rust"), 5, 3, false),
            repo("c", Some("TypeScript"), 1, 2, false),
            repo("forked", Some("Go"), 500, 4, true),
        ];
        let activity = summarize(user, repos, Utc::now());

        assert_eq!(activity.total_stars, 16);
        assert_eq!(activity.top_languages[0].language, "Rust");
        assert_eq!(activity.top_languages[0].repos, 2);
        assert!(activity.top_languages.iter().all(|l| l.language != "Go"));
        let names: Vec<_> = activity.recent_repos.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["b", "c", "a"]);
    }

    #[test]
    fn repo_payload_tolerates_missing_fork_flag() {
        let json = r#"{"name":"x","description":null,"html_url":"u","language":null,
            "stargazers_count":0,"forks_count":0,"pushed_at":null}"#;
        let repo: RepoPayload = serde_json::from_str(json).unwrap();
        assert!(!repo.fork);
    }
}
