//! Tracing setup and request-scoped trace ids shared by both front-ends.

use thiserror::Error;
use tokio::task_local;
use tracing::Subscriber;
use tracing_log::LogTracer;
use tracing_subscriber::{EnvFilter, filter::ParseError, fmt, layer::SubscriberExt};

use crate::config::AppConfig;

/// Correlation id for one REST request or RPC frame.
#[derive(Debug, Clone)]
pub struct TraceContext {
    pub trace_id: String,
}

impl TraceContext {
    /// Takes the caller's id when it is non-blank, otherwise mints one.
    pub fn from_header(value: Option<&str>) -> Self {
        let trace_id = value
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .unwrap_or_else(new_trace_id);
        Self { trace_id }
    }
}

task_local! {
    static ACTIVE_TRACE_CONTEXT: TraceContext;
}

#[derive(Debug, Error)]
pub enum TelemetryInitError {
    #[error("invalid log filter: {0}")]
    Filter(#[from] ParseError),
    #[error("log bridge already installed: {0}")]
    LogBridge(#[from] log::SetLoggerError),
    #[error("tracing subscriber already installed: {0}")]
    Subscriber(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// `RUST_LOG` wins over `LOG_LEVEL` when it is set and non-empty.
fn log_filter(rust_log: Option<&str>, log_level: &str) -> Result<EnvFilter, ParseError> {
    match rust_log.map(str::trim).filter(|d| !d.is_empty()) {
        Some(directives) => EnvFilter::try_new(directives),
        None => EnvFilter::try_new(log_level),
    }
}

/// Builds the subscriber for `LOG_LEVEL` / `LOG_FORMAT` (`json` or `pretty`).
pub fn build_subscriber(
    config: &AppConfig,
) -> Result<Box<dyn Subscriber + Send + Sync>, TelemetryInitError> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = log_filter(rust_log.as_deref(), &config.log_level)?;
    let registry = tracing_subscriber::registry().with(filter);

    Ok(match config.log_format.as_str() {
        "pretty" => Box::new(registry.with(fmt::layer().pretty())),
        _ => Box::new(registry.with(fmt::layer().json())),
    })
}

/// Installs the global subscriber and routes `log` records (sqlx, sea-orm)
/// into it. Call once, from the binary.
pub fn init_tracing(config: &AppConfig) -> Result<(), TelemetryInitError> {
    let subscriber = build_subscriber(config)?;
    LogTracer::init()?;
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Generates a fresh correlation id.
pub fn new_trace_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Runs `future` with `context` as the active trace context.
pub async fn with_trace_context<Fut, R>(context: TraceContext, future: Fut) -> R
where
    Fut: std::future::Future<Output = R>,
{
    ACTIVE_TRACE_CONTEXT.scope(context, future).await
}

/// Trace id of the enclosing [`with_trace_context`], if any.
pub fn current_trace_id() -> Option<String> {
    ACTIVE_TRACE_CONTEXT
        .try_with(|ctx| ctx.trace_id.clone())
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn trace_id_is_scoped_to_the_future() {
        assert!(current_trace_id().is_none());

        let seen = with_trace_context(TraceContext::from_header(Some("req-42")), async {
            current_trace_id()
        })
        .await;

        assert_eq!(seen.as_deref(), Some("req-42"));
        assert!(current_trace_id().is_none());
    }

    #[test]
    fn rust_log_overrides_configured_level() {
        assert!(log_filter(Some("reposync=trace"), "info").is_ok());
        assert!(log_filter(Some("  "), "warn").is_ok());
        assert!(log_filter(None, "reposync=loud").is_err());
    }

    #[test]
    fn both_formats_build() {
        for format in ["json", "pretty"] {
            let mut config = AppConfig::default();
            config.log_format = format.to_string();
            let subscriber = build_subscriber(&config).unwrap();
            tracing::subscriber::with_default(subscriber, || {
                tracing::info!(format, "subscriber built");
            });
        }
    }

    #[test]
    fn blank_header_mints_a_new_id() {
        let ctx = TraceContext::from_header(Some("  "));
        assert!(uuid::Uuid::parse_str(&ctx.trace_id).is_ok());
    }
}
