//! RPC front-end over a Unix domain socket.
//!
//! Protocol: length-prefixed JSON over a Unix domain socket.
//! Format: `[4-byte little-endian length][JSON payload]`, one request frame
//! answered by one response frame, any number of exchanges per connection.
//!
//! Requests are tagged by `method` with arguments under `params`; responses
//! are tagged by `type`. Bodies reuse the REST response types so both
//! front-ends return the same fields.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::ServiceError;
use crate::handlers::types::{
    CommitsResponse, HealthResponse, RepositoriesResponse, SyncResponse,
};
use crate::models::RepositoryInfo;

pub mod client;
pub mod server;

pub use client::RpcClient;
pub use server::{RpcServer, dispatch};

/// Largest frame either side will read.
pub const MAX_FRAME_LEN: usize = 4 * 1024 * 1024;

/// RPC request messages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum RpcRequest {
    GetRepositories,
    GetRepository {
        full_name: String,
    },
    /// Non-positive `limit` means 50; negative `offset` means 0
    GetCommits {
        full_name: String,
        #[serde(default)]
        limit: i64,
        #[serde(default)]
        offset: i64,
    },
    /// Empty `repository_urls` syncs the configured list
    SyncRepositories {
        #[serde(default)]
        repository_urls: Vec<String>,
    },
    SyncCommits {
        full_name: String,
        #[serde(default)]
        limit: i64,
    },
    SyncCommitsAll {
        #[serde(default)]
        repository_urls: Vec<String>,
        #[serde(default)]
        limit: i64,
    },
    Health,
}

/// RPC response messages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RpcResponse {
    Repositories(RepositoriesResponse),
    Repository { repository: RepositoryInfo },
    Commits(CommitsResponse),
    Sync(SyncResponse),
    Health(HealthResponse),
    Error { code: String, message: String },
}

impl RpcResponse {
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<ServiceError> for RpcResponse {
    fn from(error: ServiceError) -> Self {
        Self::error(error.kind().error_code(), error.to_string())
    }
}

/// RPC transport and protocol errors
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("rpc i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("rpc payload is not valid JSON for this message: {0}")]
    Codec(#[from] serde_json::Error),
    #[error("rpc frame of {len} bytes exceeds the 4 MiB limit")]
    FrameTooLarge { len: usize },
    #[error("rpc connection closed by peer")]
    ConnectionClosed,
    #[error("rpc call failed with {code}: {message}")]
    Remote { code: String, message: String },
    #[error("unexpected rpc response: {0}")]
    UnexpectedResponse(String),
}

/// Writes one length-prefixed JSON frame.
pub async fn write_frame<W, T>(writer: &mut W, message: &T) -> Result<(), RpcError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let payload = serde_json::to_vec(message)?;
    if payload.len() > MAX_FRAME_LEN {
        return Err(RpcError::FrameTooLarge { len: payload.len() });
    }
    let len = u32::try_from(payload.len()).map_err(|_| RpcError::FrameTooLarge {
        len: payload.len(),
    })?;

    writer.write_all(&len.to_le_bytes()).await?;
    writer.write_all(&payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads one frame's payload; `None` when the peer closed between frames.
pub async fn read_frame_bytes<R>(reader: &mut R) -> Result<Option<Vec<u8>>, RpcError>
where
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let len = u32::from_le_bytes(len_buf) as usize;
    if len > MAX_FRAME_LEN {
        return Err(RpcError::FrameTooLarge { len });
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    Ok(Some(payload))
}

/// Reads and decodes one frame, treating a closed connection as an error.
pub async fn read_frame<R, T>(reader: &mut R) -> Result<T, RpcError>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let payload = read_frame_bytes(reader)
        .await?
        .ok_or(RpcError::ConnectionClosed)?;
    Ok(serde_json::from_slice(&payload)?)
}
