//! GitHub REST client
//!
//! Fetches repository metadata and recent commits from the GitHub v3 API and
//! maps the wire shapes into the records the store writes.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::config::GitHubConfig;
use crate::connectors::RepositorySource;
use crate::models::{CommitRecord, RepositoryRecord};

/// Prefix stripped from reference URLs before splitting into owner and name.
pub const REFERENCE_PREFIX: &str = "https://github.com/";

/// Page size used when a caller passes a non-positive commit limit.
pub const DEFAULT_COMMIT_LIMIT: i64 = 50;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const ACCEPT_HEADER: &str = "application/vnd.github.v3+json";
const USER_AGENT: &str = concat!("reposync/", env!("CARGO_PKG_VERSION"));

/// GitHub client errors
#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("malformed repository reference: {reference}")]
    MalformedReference { reference: String },

    #[error("GitHub API returned status {status}: {body}")]
    Provider { status: u16, body: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("failed to decode GitHub response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid request URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Owner and name parsed out of a reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// Splits `https://github.com/{owner}/{name}` into its parts.
///
/// Inputs without the prefix are split as-is, so `owner/name` also parses.
/// Segments past the second are ignored. Fewer than two segments, or an empty
/// owner or name, is rejected without touching the network.
pub fn parse_reference(reference: &str) -> Result<RepoRef, GitHubError> {
    let trimmed = reference.trim();
    let path = trimmed.strip_prefix(REFERENCE_PREFIX).unwrap_or(trimmed);
    let mut parts = path.split('/');

    let malformed = || GitHubError::MalformedReference {
        reference: reference.to_string(),
    };

    let owner = parts.next().filter(is_path_segment).ok_or_else(malformed)?;
    let name = parts
        .next()
        .map(|s| s.strip_suffix(".git").unwrap_or(s))
        .filter(is_path_segment)
        .ok_or_else(malformed)?;

    Ok(RepoRef {
        owner: owner.to_string(),
        name: name.to_string(),
    })
}

fn is_path_segment(segment: &&str) -> bool {
    !segment.is_empty() && *segment != "." && *segment != ".."
}

/// Maps a caller-supplied limit to the page size actually requested.
pub fn effective_commit_limit(limit: i64) -> i64 {
    if limit <= 0 {
        DEFAULT_COMMIT_LIMIT
    } else {
        limit
    }
}

#[derive(Debug, Deserialize)]
struct GitHubRepository {
    name: String,
    full_name: String,
    description: Option<String>,
    html_url: String,
    language: Option<String>,
    stargazers_count: i64,
    forks_count: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<GitHubRepository> for RepositoryRecord {
    fn from(repo: GitHubRepository) -> Self {
        Self {
            name: repo.name,
            full_name: repo.full_name,
            description: repo.description.unwrap_or_default(),
            url: repo.html_url,
            language: repo.language.unwrap_or_default(),
            stars: repo.stargazers_count,
            forks: repo.forks_count,
            created_at: repo.created_at,
            updated_at: repo.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GitHubCommit {
    sha: String,
    commit: GitHubCommitDetail,
}

#[derive(Debug, Deserialize)]
struct GitHubCommitDetail {
    message: String,
    author: GitHubCommitAuthor,
}

#[derive(Debug, Deserialize)]
struct GitHubCommitAuthor {
    name: String,
    email: String,
    date: DateTime<Utc>,
}

impl GitHubCommit {
    fn into_record(self, repository_full_name: &str) -> CommitRecord {
        CommitRecord {
            sha: self.sha,
            message: self.commit.message,
            author_name: self.commit.author.name,
            author_email: self.commit.author.email,
            commit_date: self.commit.author.date,
            repository_full_name: repository_full_name.to_string(),
        }
    }
}

/// GitHub API client
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_base: String,
    token: Option<String>,
}

impl GitHubClient {
    /// Builds a client from configuration. The token is kept only if usable.
    pub fn new(config: &GitHubConfig) -> Result<Self, GitHubError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            token: config.effective_token().map(str::to_string),
        })
    }

    /// `{api_base}/repos/{owner}/{name}/{tail..}` with every segment escaped.
    fn repo_url(&self, repo_ref: &RepoRef, tail: &[&str]) -> Result<Url, GitHubError> {
        let mut url = Url::parse(&self.api_base)?;
        url.path_segments_mut()
            .map_err(|()| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(["repos", repo_ref.owner.as_str(), repo_ref.name.as_str()])
            .extend(tail);
        Ok(url)
    }

    /// Issues one GET and decodes the success body as `T`.
    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T, GitHubError> {
        debug!(%url, "GitHub request");

        let mut request = self.http.get(url).header("Accept", ACCEPT_HEADER);
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("token {}", token));
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let body = String::from_utf8_lossy(&body).into_owned();
            warn!(status = status.as_u16(), "GitHub API error response");
            return Err(GitHubError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl RepositorySource for GitHubClient {
    async fn fetch_repository(&self, reference: &str) -> Result<RepositoryRecord, GitHubError> {
        let repo_ref = parse_reference(reference)?;
        let url = self.repo_url(&repo_ref, &[])?;

        let repo: GitHubRepository = self.get_json(url).await?;
        Ok(repo.into())
    }

    async fn fetch_commits(
        &self,
        full_name: &str,
        limit: i64,
    ) -> Result<Vec<CommitRecord>, GitHubError> {
        let repo_ref = parse_reference(full_name)?;
        let mut url = self.repo_url(&repo_ref, &["commits"])?;
        url.query_pairs_mut()
            .append_pair("per_page", &effective_commit_limit(limit).to_string());

        let commits: Vec<GitHubCommit> = self.get_json(url).await?;
        Ok(commits
            .into_iter()
            .map(|c| c.into_record(full_name))
            .collect())
    }
}
