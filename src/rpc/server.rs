//! RPC server: accept loop, per-connection frame loop and request dispatch.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::io::AsyncWrite;
use tokio::net::{UnixListener, UnixStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::handlers::types::{CommitsResponse, HealthResponse, SyncResponse};
use crate::rpc::{RpcError, RpcRequest, RpcResponse, read_frame_bytes, write_frame};
use crate::service::RepositoryService;
use crate::telemetry::{TraceContext, with_trace_context};

/// Translates one request into service calls.
pub async fn dispatch(service: &dyn RepositoryService, request: RpcRequest) -> RpcResponse {
    let result = match request {
        RpcRequest::GetRepositories => service
            .list_repositories()
            .await
            .map(|repos| RpcResponse::Repositories(repos.into())),
        RpcRequest::GetRepository { full_name } => service
            .get_repository(&full_name)
            .await
            .map(|repository| RpcResponse::Repository { repository }),
        RpcRequest::GetCommits {
            full_name,
            limit,
            offset,
        } => service
            .list_commits(&full_name, limit, offset)
            .await
            .map(|page| RpcResponse::Commits(CommitsResponse::new(full_name, page))),
        RpcRequest::SyncRepositories { repository_urls } => service
            .sync_repositories(repository_urls)
            .await
            .map(|report| RpcResponse::Sync(SyncResponse::repositories(report))),
        RpcRequest::SyncCommits { full_name, limit } => service
            .sync_commits(&full_name, limit)
            .await
            .map(|report| RpcResponse::Sync(SyncResponse::commits(&full_name, report))),
        RpcRequest::SyncCommitsAll {
            repository_urls,
            limit,
        } => service
            .sync_commits_all(repository_urls, limit)
            .await
            .map(|report| RpcResponse::Sync(SyncResponse::commits_all(report))),
        RpcRequest::Health => Ok(RpcResponse::Health(HealthResponse::default())),
    };

    result.unwrap_or_else(RpcResponse::from)
}

/// RPC server bound to a Unix socket path
pub struct RpcServer {
    listener: UnixListener,
    socket_path: PathBuf,
    service: Arc<dyn RepositoryService>,
}

impl RpcServer {
    /// Binds the socket, replacing a stale socket file and creating the
    /// parent directory if needed.
    pub fn bind(socket_path: &Path, service: Arc<dyn RepositoryService>) -> io::Result<Self> {
        if socket_path.exists() {
            std::fs::remove_file(socket_path)?;
        }
        if let Some(parent) = socket_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let listener = UnixListener::bind(socket_path)?;
        info!(socket = %socket_path.display(), "RPC server listening");

        Ok(Self {
            listener,
            socket_path: socket_path.to_path_buf(),
            service,
        })
    }

    /// Accepts connections until `shutdown` is cancelled, then removes the
    /// socket file.
    pub async fn serve(self, shutdown: CancellationToken) -> io::Result<()> {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, _addr)) => {
                        debug!("RPC connection accepted");
                        let service = self.service.clone();
                        let shutdown = shutdown.child_token();
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, service, shutdown).await {
                                warn!(error = %e, "RPC connection ended with error");
                            }
                        });
                    }
                    Err(e) => {
                        error!(error = %e, "Error accepting RPC connection");
                        return Err(e);
                    }
                },
            }
        }

        let _ = std::fs::remove_file(&self.socket_path);
        info!("RPC server stopped");
        Ok(())
    }
}

/// Binds and serves the RPC front-end at `socket_path`.
pub async fn run_rpc_server(
    socket_path: &Path,
    service: Arc<dyn RepositoryService>,
    shutdown: CancellationToken,
) -> io::Result<()> {
    RpcServer::bind(socket_path, service)?.serve(shutdown).await
}

async fn handle_connection(
    mut stream: UnixStream,
    service: Arc<dyn RepositoryService>,
    shutdown: CancellationToken,
) -> Result<(), RpcError> {
    loop {
        let payload = tokio::select! {
            _ = shutdown.cancelled() => return Ok(()),
            frame = read_frame_bytes(&mut stream) => match frame? {
                Some(payload) => payload,
                None => return Ok(()),
            },
        };

        let response = match serde_json::from_slice::<RpcRequest>(&payload) {
            Ok(request) => {
                let context = TraceContext::from_header(None);
                debug!(trace_id = %context.trace_id, ?request, "RPC request");
                with_trace_context(context, dispatch(service.as_ref(), request)).await
            }
            Err(e) => RpcResponse::error("INVALID_REQUEST", format!("Invalid request: {e}")),
        };

        respond(&mut stream, &response).await?;
    }
}

/// Writes `response`, or a `RESPONSE_TOO_LARGE` error frame when it would
/// exceed the frame limit.
async fn respond<W>(writer: &mut W, response: &RpcResponse) -> Result<(), RpcError>
where
    W: AsyncWrite + Unpin,
{
    match write_frame(writer, response).await {
        Err(RpcError::FrameTooLarge { len }) => {
            warn!(len, "RPC response exceeds frame limit");
            let error = RpcResponse::error(
                "RESPONSE_TOO_LARGE",
                format!("response of {len} bytes exceeds the 4 MiB frame limit"),
            );
            write_frame(writer, &error).await
        }
        result => result,
    }
}
