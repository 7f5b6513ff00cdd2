//! # Error Handling
//!
//! The error taxonomy shared by the sync engine and both front-ends, and the
//! REST `application/problem+json` response built from it.

use axum::{
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::connectors::GitHubError;
use crate::repositories::StoreError;
use crate::telemetry;

/// Classification of every failure the service can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedReference,
    Network,
    Provider,
    Decode,
    Storage,
    NotFound,
    NoTargets,
    InvalidRequest,
    Internal,
}

impl ErrorKind {
    /// HTTP status used by the REST front-end for this kind.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorKind::MalformedReference | ErrorKind::NoTargets | ErrorKind::InvalidRequest => {
                StatusCode::BAD_REQUEST
            }
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Network | ErrorKind::Provider => StatusCode::BAD_GATEWAY,
            ErrorKind::Decode | ErrorKind::Storage | ErrorKind::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Stable code string shared by REST bodies and RPC error frames.
    pub fn error_code(&self) -> &'static str {
        match self {
            ErrorKind::MalformedReference => "MALFORMED_REFERENCE",
            ErrorKind::Network => "NETWORK_ERROR",
            ErrorKind::Provider => "PROVIDER_ERROR",
            ErrorKind::Decode => "DECODE_ERROR",
            ErrorKind::Storage => "STORAGE_ERROR",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::NoTargets => "NO_TARGETS",
            ErrorKind::InvalidRequest => "INVALID_REQUEST",
            ErrorKind::Internal => "INTERNAL_ERROR",
        }
    }
}

impl From<&GitHubError> for ErrorKind {
    fn from(error: &GitHubError) -> Self {
        match error {
            GitHubError::MalformedReference { .. } | GitHubError::Url(_) => {
                ErrorKind::MalformedReference
            }
            GitHubError::Provider { .. } => ErrorKind::Provider,
            GitHubError::Network(_) => ErrorKind::Network,
            GitHubError::Decode(_) => ErrorKind::Decode,
        }
    }
}

impl From<&StoreError> for ErrorKind {
    fn from(error: &StoreError) -> Self {
        match error {
            StoreError::NotFound { .. } => ErrorKind::NotFound,
            StoreError::Database(_) => ErrorKind::Storage,
        }
    }
}

/// Errors returned by the sync engine and the service layer.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    GitHub(#[from] GitHubError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("No repository URLs provided")]
    NoTargets,
    #[error("sync task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::GitHub(e) => e.into(),
            ServiceError::Store(e) => e.into(),
            ServiceError::NoTargets => ErrorKind::NoTargets,
            ServiceError::Task(_) => ErrorKind::Internal,
        }
    }
}

/// Unified API error response structure
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApiError {
    /// HTTP status code for the response
    #[serde(skip_serializing, skip_deserializing)]
    pub status: StatusCode,
    /// Error code for programmatic handling
    pub code: Box<str>,
    /// Human-readable error message
    pub message: Box<str>,
    /// Additional error details (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Box<serde_json::Value>>,
    /// Correlation trace ID for debugging (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<Box<str>>,
}

impl ApiError {
    /// Create a new API error with the given status code and message
    pub fn new<S: Into<String>>(status: StatusCode, code: S, message: S) -> Self {
        Self {
            status,
            code: code.into().into_boxed_str(),
            message: message.into().into_boxed_str(),
            details: None,
            trace_id: telemetry::current_trace_id().map(String::into_boxed_str),
        }
    }

    /// Add details to the error
    pub fn with_details<V: Into<serde_json::Value>>(mut self, details: V) -> Self {
        self.details = Some(Box::new(details.into()));
        self
    }

    /// Request body or parameters could not be interpreted.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        let kind = ErrorKind::InvalidRequest;
        Self::new(kind.status_code(), kind.error_code().to_string(), message.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut headers = HeaderMap::new();
        headers.insert(
            "content-type",
            HeaderValue::from_static("application/problem+json"),
        );

        (self.status, headers, axum::Json(self)).into_response()
    }
}

/// Maximum number of upstream body bytes echoed back to REST clients.
const PROVIDER_BODY_SNIPPET: usize = 200;

impl From<ServiceError> for ApiError {
    fn from(error: ServiceError) -> Self {
        let kind = error.kind();
        match kind {
            ErrorKind::Storage | ErrorKind::Decode | ErrorKind::Internal => {
                tracing::error!(error = %error, "request failed");
            }
            _ => tracing::debug!(error = %error, "request rejected"),
        }

        let api_error = Self::new(
            kind.status_code(),
            kind.error_code().to_string(),
            error.to_string(),
        );

        match error {
            ServiceError::GitHub(GitHubError::Provider { status, body }) => {
                let snippet: String = body.chars().take(PROVIDER_BODY_SNIPPET).collect();
                api_error.with_details(serde_json::json!({
                    "provider": "github",
                    "status": status,
                    "body_snippet": snippet,
                }))
            }
            _ => api_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::{TraceContext, with_trace_context};

    #[test]
    fn kinds_map_to_expected_statuses() {
        assert_eq!(ErrorKind::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorKind::NoTargets.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ErrorKind::MalformedReference.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ErrorKind::Provider.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(ErrorKind::Network.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            ErrorKind::Storage.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ErrorKind::Decode.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn service_error_kinds() {
        let not_found = ServiceError::from(StoreError::NotFound {
            full_name: "a/b".to_string(),
        });
        assert_eq!(not_found.kind(), ErrorKind::NotFound);

        let malformed = ServiceError::from(GitHubError::MalformedReference {
            reference: "x".to_string(),
        });
        assert_eq!(malformed.kind(), ErrorKind::MalformedReference);

        assert_eq!(ServiceError::NoTargets.kind(), ErrorKind::NoTargets);
    }

    #[test]
    fn provider_error_details_truncate_body() {
        let error = ServiceError::from(GitHubError::Provider {
            status: 500,
            body: "x".repeat(1000),
        });
        let api_error = ApiError::from(error);

        assert_eq!(api_error.status, StatusCode::BAD_GATEWAY);
        assert_eq!(&*api_error.code, "PROVIDER_ERROR");
        let details = api_error.details.unwrap();
        assert_eq!(details["status"], 500);
        assert_eq!(details["body_snippet"].as_str().unwrap().len(), 200);
    }

    #[tokio::test]
    async fn trace_id_comes_from_active_context() {
        let error = with_trace_context(TraceContext::from_header(Some("trace-1")), async {
            ApiError::from(ServiceError::NoTargets)
        })
        .await;

        assert_eq!(error.trace_id.as_deref(), Some("trace-1"));
        assert_eq!(&*error.message, "No repository URLs provided");
    }

    #[tokio::test]
    async fn response_uses_problem_json() {
        let response = ApiError::from(ServiceError::NoTargets).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/problem+json"
        );
    }
}
