//! RPC client
//!
//! Holds one connection and issues calls sequentially over it.

use std::path::Path;

use tokio::net::UnixStream;

use crate::handlers::types::{CommitsResponse, HealthResponse, RepositoriesResponse, SyncResponse};
use crate::models::RepositoryInfo;
use crate::rpc::{RpcError, RpcRequest, RpcResponse, read_frame, write_frame};

/// RPC client
pub struct RpcClient {
    stream: UnixStream,
}

impl RpcClient {
    pub async fn connect(socket_path: &Path) -> Result<Self, RpcError> {
        let stream = UnixStream::connect(socket_path).await?;
        Ok(Self { stream })
    }

    /// Sends one request and waits for its response. Error responses are
    /// returned as `Ok(RpcResponse::Error { .. })`.
    pub async fn call(&mut self, request: &RpcRequest) -> Result<RpcResponse, RpcError> {
        write_frame(&mut self.stream, request).await?;
        read_frame(&mut self.stream).await
    }

    /// Like [`call`](Self::call), but turns error responses into
    /// [`RpcError::Remote`].
    async fn call_ok(&mut self, request: RpcRequest) -> Result<RpcResponse, RpcError> {
        match self.call(&request).await? {
            RpcResponse::Error { code, message } => Err(RpcError::Remote { code, message }),
            response => Ok(response),
        }
    }

    pub async fn get_repositories(&mut self) -> Result<RepositoriesResponse, RpcError> {
        match self.call_ok(RpcRequest::GetRepositories).await? {
            RpcResponse::Repositories(body) => Ok(body),
            other => Err(unexpected(other)),
        }
    }

    pub async fn get_repository(&mut self, full_name: &str) -> Result<RepositoryInfo, RpcError> {
        let request = RpcRequest::GetRepository {
            full_name: full_name.to_string(),
        };
        match self.call_ok(request).await? {
            RpcResponse::Repository { repository } => Ok(repository),
            other => Err(unexpected(other)),
        }
    }

    pub async fn get_commits(
        &mut self,
        full_name: &str,
        limit: i64,
        offset: i64,
    ) -> Result<CommitsResponse, RpcError> {
        let request = RpcRequest::GetCommits {
            full_name: full_name.to_string(),
            limit,
            offset,
        };
        match self.call_ok(request).await? {
            RpcResponse::Commits(body) => Ok(body),
            other => Err(unexpected(other)),
        }
    }

    pub async fn sync_repositories(
        &mut self,
        repository_urls: Vec<String>,
    ) -> Result<SyncResponse, RpcError> {
        self.expect_sync(RpcRequest::SyncRepositories { repository_urls })
            .await
    }

    pub async fn sync_commits(
        &mut self,
        full_name: &str,
        limit: i64,
    ) -> Result<SyncResponse, RpcError> {
        self.expect_sync(RpcRequest::SyncCommits {
            full_name: full_name.to_string(),
            limit,
        })
        .await
    }

    pub async fn sync_commits_all(
        &mut self,
        repository_urls: Vec<String>,
        limit: i64,
    ) -> Result<SyncResponse, RpcError> {
        self.expect_sync(RpcRequest::SyncCommitsAll {
            repository_urls,
            limit,
        })
        .await
    }

    pub async fn health(&mut self) -> Result<HealthResponse, RpcError> {
        match self.call_ok(RpcRequest::Health).await? {
            RpcResponse::Health(body) => Ok(body),
            other => Err(unexpected(other)),
        }
    }

    async fn expect_sync(&mut self, request: RpcRequest) -> Result<SyncResponse, RpcError> {
        match self.call_ok(request).await? {
            RpcResponse::Sync(body) => Ok(body),
            other => Err(unexpected(other)),
        }
    }
}

fn unexpected(response: RpcResponse) -> RpcError {
    RpcError::UnexpectedResponse(format!("{response:?}"))
}
