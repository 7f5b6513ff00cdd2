//! Test utilities shared by the integration suites.
//!
//! Each [`TestEnv`] owns a temp directory holding the SQLite file and RPC
//! socket, plus a wiremock server standing in for the GitHub API.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use reposync::{
    config::AppConfig,
    db,
    server::{AppState, create_app},
    service::{CatalogService, RepositoryService},
};
use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub struct TestEnv {
    pub dir: TempDir,
    pub github: MockServer,
    pub config: AppConfig,
    pub service: Arc<dyn RepositoryService>,
}

impl TestEnv {
    /// Fresh store and mock GitHub; `defaults` becomes the configured list.
    pub async fn new(defaults: &[&str]) -> Result<Self> {
        let dir = tempfile::tempdir()?;
        let github = MockServer::start().await;

        let mut config = AppConfig::default();
        config.database_path = dir.path().join("reposync.db");
        config.server.rpc_address = dir.path().join("reposync.sock");
        config.github.api_base = github.uri();
        config.github.repositories = defaults.iter().map(|s| s.to_string()).collect();

        let db = Arc::new(db::init_pool(&config).await?);
        let service: Arc<dyn RepositoryService> =
            Arc::new(CatalogService::from_config(&config, db)?);

        Ok(Self {
            dir,
            github,
            config,
            service,
        })
    }

    pub fn app(&self) -> Router {
        create_app(AppState {
            service: self.service.clone(),
        })
    }

    pub fn socket_path(&self) -> PathBuf {
        self.config.server.rpc_address.clone()
    }
}

/// GitHub `GET /repos/{owner}/{name}` payload.
pub fn repository_json(full_name: &str, stars: i64) -> Value {
    let name = full_name.rsplit('/').next().unwrap_or(full_name);
    json!({
        "id": 1,
        "name": name,
        "full_name": full_name,
        "description": format!("{name} project"),
        "html_url": format!("https://github.com/{full_name}"),
        "language": "Rust",
        "stargazers_count": stars,
        "forks_count": stars / 10,
        "created_at": "2020-05-01T10:00:00Z",
        "updated_at": "2024-05-01T10:00:00Z"
    })
}

/// GitHub `GET /repos/{owner}/{name}/commits` payload, newest first.
pub fn commits_json(shas: &[&str]) -> Value {
    let commits: Vec<Value> = shas
        .iter()
        .enumerate()
        .map(|(i, sha)| {
            json!({
                "sha": sha,
                "commit": {
                    "message": format!("change {sha}"),
                    "author": {
                        "name": "Octo Cat",
                        "email": "octo@example.com",
                        "date": format!("2024-02-{:02}T09:00:00Z", 28 - i)
                    }
                }
            })
        })
        .collect();
    Value::Array(commits)
}

pub async fn mount_repository(server: &MockServer, full_name: &str, stars: i64) {
    Mock::given(method("GET"))
        .and(path(format!("/repos/{full_name}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(repository_json(full_name, stars)))
        .mount(server)
        .await;
}

pub async fn mount_missing_repository(server: &MockServer, full_name: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/repos/{full_name}")))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"message": "Not Found"})),
        )
        .mount(server)
        .await;
}

pub async fn mount_commits(server: &MockServer, full_name: &str, shas: &[&str]) {
    Mock::given(method("GET"))
        .and(path(format!("/repos/{full_name}/commits")))
        .respond_with(ResponseTemplate::new(200).set_body_json(commits_json(shas)))
        .mount(server)
        .await;
}
