//! # Server Configuration
//!
//! Router, middleware and listener for the REST front-end.

use std::sync::Arc;

use axum::{
    Router,
    extract::Request,
    http::HeaderValue,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppConfig;
use crate::handlers;
use crate::service::RepositoryService;
use crate::telemetry::{TraceContext, with_trace_context};

/// Header carrying the request correlation id in both directions.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<dyn RepositoryService>,
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    let api = Router::new()
        .route("/repositories", get(handlers::repositories::list_repositories))
        .route(
            "/repositories/sync",
            post(handlers::repositories::sync_repositories),
        )
        .route(
            "/repositories/{owner}/{name}",
            get(handlers::repositories::get_repository),
        )
        .route("/commits/sync", post(handlers::commits::sync_all_commits))
        .route(
            "/commits/sync/{owner}/{name}",
            post(handlers::commits::sync_commits),
        )
        .route("/commits/{owner}/{name}", get(handlers::commits::list_commits))
        .route("/health", get(handlers::health));

    Router::new()
        .route("/", get(handlers::root))
        .nest("/api/v1", api)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(trace_context)),
        )
}

/// Scopes the request in a [`TraceContext`] and echoes its id back.
async fn trace_context(request: Request, next: Next) -> Response {
    let context = TraceContext::from_header(
        request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok()),
    );
    let trace_id = context.trace_id.clone();

    let mut response = with_trace_context(context, next.run(request)).await;
    if let Ok(value) = HeaderValue::from_str(&trace_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Serves the REST front-end until `shutdown` is cancelled.
pub async fn run_http_server(
    config: &AppConfig,
    service: Arc<dyn RepositoryService>,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let app = create_app(AppState { service });

    let addr = config
        .http_bind_addr()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, profile = %config.profile, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::health,
        crate::handlers::repositories::list_repositories,
        crate::handlers::repositories::get_repository,
        crate::handlers::repositories::sync_repositories,
        crate::handlers::commits::list_commits,
        crate::handlers::commits::sync_commits,
        crate::handlers::commits::sync_all_commits,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::models::RepositoryInfo,
            crate::models::CommitInfo,
            crate::handlers::types::RepositoriesResponse,
            crate::handlers::types::CommitsResponse,
            crate::handlers::types::SyncRequest,
            crate::handlers::types::SyncResponse,
            crate::handlers::types::SkippedItem,
            crate::handlers::types::HealthResponse,
            crate::error::ApiError,
        )
    ),
    tags(
        (name = "repositories", description = "Stored repositories"),
        (name = "commits", description = "Stored commits"),
        (name = "sync", description = "Pull data from GitHub into the store"),
    ),
    info(
        title = "reposync API",
        description = "GitHub repository and commit sync service",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
