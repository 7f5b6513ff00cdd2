//! Configuration loading for reposync.
//!
//! Loads layered `.env` files and environment variables prefixed with
//! `REPOSYNC_`, producing a typed [`AppConfig`].

use std::{
    collections::BTreeMap,
    env,
    net::SocketAddr,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Prefix every recognized environment key carries.
pub const ENV_PREFIX: &str = "REPOSYNC_";

/// Token value shipped in sample configs; treated as "no token".
pub const PLACEHOLDER_GITHUB_TOKEN: &str = "your_github_token_here";

/// Application configuration derived from `REPOSYNC_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct AppConfig {
    #[serde(default = "default_profile")]
    pub profile: String,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub github: GitHubConfig,
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,
    #[serde(default = "default_db_acquire_timeout_ms")]
    pub db_acquire_timeout_ms: u64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

/// Front-end listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ServerConfig {
    #[serde(default = "default_http_host")]
    pub http_host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    #[serde(default = "default_true")]
    pub http_enable: bool,
    /// Filesystem path of the RPC Unix socket.
    #[serde(default = "default_rpc_address")]
    pub rpc_address: PathBuf,
    #[serde(default = "default_true")]
    pub rpc_enable: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_host: default_http_host(),
            http_port: default_http_port(),
            http_enable: true,
            rpc_address: default_rpc_address(),
            rpc_enable: true,
        }
    }
}

/// Upstream GitHub API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct GitHubConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Default reference list used when a sync request names none.
    #[serde(default)]
    pub repositories: Vec<String>,
    #[serde(default = "default_github_api_base")]
    pub api_base: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            repositories: Vec::new(),
            api_base: default_github_api_base(),
        }
    }
}

impl GitHubConfig {
    /// Returns the token only when it is usable as a credential.
    pub fn effective_token(&self) -> Option<&str> {
        self.token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty() && *t != PLACEHOLDER_GITHUB_TOKEN)
    }
}

fn default_profile() -> String {
    "local".to_string()
}

fn default_http_host() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    8080
}

fn default_true() -> bool {
    true
}

fn default_rpc_address() -> PathBuf {
    PathBuf::from("./data/reposync.sock")
}

fn default_github_api_base() -> String {
    "https://api.github.com".to_string()
}

fn default_database_path() -> PathBuf {
    PathBuf::from("./data/reposync.db")
}

fn default_db_max_connections() -> u32 {
    5
}

fn default_db_acquire_timeout_ms() -> u64 {
    5000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            profile: default_profile(),
            server: ServerConfig::default(),
            github: GitHubConfig::default(),
            database_path: default_database_path(),
            db_max_connections: default_db_max_connections(),
            db_acquire_timeout_ms: default_db_acquire_timeout_ms(),
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

impl AppConfig {
    /// Returns the REST bind address as a socket address.
    pub fn http_bind_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.server.http_host, self.server.http_port).parse()
    }

    /// SQLite connection URL for the configured database file.
    pub fn database_url(&self) -> String {
        format!("sqlite://{}?mode=rwc", self.database_path.display())
    }

    /// Returns a redacted JSON representation (the GitHub token is masked).
    pub fn redacted_json(&self) -> serde_json::Result<String> {
        let mut config = self.clone();
        if config.github.token.is_some() {
            config.github.token = Some("[REDACTED]".to_string());
        }
        serde_json::to_string(&config)
    }

    /// Validates cross-field constraints that serde defaults cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.server.http_enable && !self.server.rpc_enable {
            return Err(ConfigError::NoFrontEndEnabled);
        }

        if self.server.http_enable {
            if let Err(source) = self.http_bind_addr() {
                return Err(ConfigError::InvalidBindAddr {
                    value: format!("{}:{}", self.server.http_host, self.server.http_port),
                    source,
                });
            }
        }

        if self.server.rpc_enable && self.server.rpc_address.as_os_str().is_empty() {
            return Err(ConfigError::EmptyRpcAddress);
        }

        if self.database_path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }

        if self.db_max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections {
                value: self.db_max_connections,
            });
        }

        Ok(())
    }
}

/// Front-ends selected by `--server`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ServerMode {
    Http,
    Rpc,
    Both,
}

impl AppConfig {
    /// Replaces both enable switches with the ones `mode` selects.
    pub fn apply_server_mode(&mut self, mode: ServerMode) {
        self.server.http_enable = matches!(mode, ServerMode::Http | ServerMode::Both);
        self.server.rpc_enable = matches!(mode, ServerMode::Rpc | ServerMode::Both);
    }
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load environment file {path}: {source}")]
    EnvFile {
        path: PathBuf,
        source: dotenvy::Error,
    },
    #[error("invalid http bind address '{value}': {source}")]
    InvalidBindAddr {
        value: String,
        source: std::net::AddrParseError,
    },
    #[error("invalid value '{value}' for {key}: expected {expected}")]
    InvalidValue {
        key: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error(
        "no front-end enabled; set REPOSYNC_SERVER_HTTP_ENABLE or REPOSYNC_SERVER_RPC_ENABLE to true"
    )]
    NoFrontEndEnabled,
    #[error("rpc address is empty; set REPOSYNC_SERVER_RPC_ADDRESS")]
    EmptyRpcAddress,
    #[error("database path is empty; set REPOSYNC_DATABASE_PATH")]
    EmptyDatabasePath,
    #[error("database max connections must be at least 1, got {value}")]
    InvalidMaxConnections { value: u32 },
}

/// Loads configuration using layered `.env` files and `REPOSYNC_*` env vars.
pub struct ConfigLoader {
    base_dir: PathBuf,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a new loader rooted at the current working directory.
    pub fn new() -> Self {
        Self {
            base_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Creates a loader rooted at the provided directory (useful for tests).
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Loads `.env` layers, overlays the process environment and validates.
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        self.load_with_mode(None)
    }

    /// Like [`load`](Self::load), but a `mode` from the command line replaces
    /// the enable switches before validation.
    pub fn load_with_mode(&self, mode: Option<ServerMode>) -> Result<AppConfig, ConfigError> {
        let mut config = self.load_unvalidated()?;
        if let Some(mode) = mode {
            config.apply_server_mode(mode);
        }
        config.validate()?;
        Ok(config)
    }

    /// Builds the typed configuration without cross-field validation.
    pub fn load_unvalidated(&self) -> Result<AppConfig, ConfigError> {
        let (mut layered, profile_hint) = self.collect_layered_env()?;

        // Overlay process environment last so it wins.
        for (key, value) in env::vars() {
            if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                layered.insert(stripped.to_string(), value);
            }
        }

        let profile = take_string(&mut layered, "PROFILE").unwrap_or(profile_hint);

        let server = ServerConfig {
            http_host: take_string(&mut layered, "SERVER_HTTP_HOST")
                .unwrap_or_else(default_http_host),
            http_port: take_parsed(&mut layered, "SERVER_HTTP_PORT", "a port number")?
                .unwrap_or_else(default_http_port),
            http_enable: take_bool(&mut layered, "SERVER_HTTP_ENABLE")?.unwrap_or(true),
            rpc_address: take_string(&mut layered, "SERVER_RPC_ADDRESS")
                .map(PathBuf::from)
                .unwrap_or_else(default_rpc_address),
            rpc_enable: take_bool(&mut layered, "SERVER_RPC_ENABLE")?.unwrap_or(true),
        };

        let github = GitHubConfig {
            token: take_string(&mut layered, "GITHUB_TOKEN"),
            repositories: take_string(&mut layered, "GITHUB_REPOSITORIES")
                .map(|list| {
                    list.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            api_base: take_string(&mut layered, "GITHUB_API_BASE")
                .map(|base| base.trim_end_matches('/').to_string())
                .unwrap_or_else(default_github_api_base),
        };

        let config = AppConfig {
            profile,
            server,
            github,
            database_path: take_string(&mut layered, "DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(default_database_path),
            db_max_connections: take_parsed(&mut layered, "DB_MAX_CONNECTIONS", "an integer")?
                .unwrap_or_else(default_db_max_connections),
            db_acquire_timeout_ms: take_parsed(
                &mut layered,
                "DB_ACQUIRE_TIMEOUT_MS",
                "milliseconds",
            )?
            .unwrap_or_else(default_db_acquire_timeout_ms),
            log_level: take_string(&mut layered, "LOG_LEVEL").unwrap_or_else(default_log_level),
            log_format: take_string(&mut layered, "LOG_FORMAT")
                .unwrap_or_else(default_log_format),
        };

        Ok(config)
    }

    fn collect_layered_env(&self) -> Result<(BTreeMap<String, String>, String), ConfigError> {
        let mut values = BTreeMap::new();

        self.merge_dotenv(self.base_dir.join(".env"), &mut values)?;
        self.merge_dotenv(self.base_dir.join(".env.local"), &mut values)?;

        let profile = env::var(format!("{ENV_PREFIX}PROFILE"))
            .ok()
            .or_else(|| values.get("PROFILE").cloned())
            .unwrap_or_else(default_profile);

        self.merge_dotenv(
            self.base_dir.join(format!(".env.{}", &profile)),
            &mut values,
        )?;
        self.merge_dotenv(
            self.base_dir.join(format!(".env.{}.local", &profile)),
            &mut values,
        )?;

        Ok((values, profile))
    }

    fn merge_dotenv(
        &self,
        path: PathBuf,
        values: &mut BTreeMap<String, String>,
    ) -> Result<(), ConfigError> {
        match dotenvy::from_path_iter(&path) {
            Ok(iter) => {
                for item in iter {
                    let (key, value) = item.map_err(|source| ConfigError::EnvFile {
                        path: path.clone(),
                        source,
                    })?;
                    if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                        values.insert(stripped.to_string(), value);
                    }
                }
                Ok(())
            }
            Err(dotenvy::Error::Io(ref io_err))
                if io_err.kind() == std::io::ErrorKind::NotFound =>
            {
                Ok(())
            }
            Err(err) => Err(ConfigError::EnvFile { path, source: err }),
        }
    }
}

fn take_string(values: &mut BTreeMap<String, String>, key: &str) -> Option<String> {
    values
        .remove(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn take_parsed<T: std::str::FromStr>(
    values: &mut BTreeMap<String, String>,
    key: &'static str,
    expected: &'static str,
) -> Result<Option<T>, ConfigError> {
    match take_string(values, key) {
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key,
                value: raw,
                expected,
            }),
        None => Ok(None),
    }
}

fn take_bool(
    values: &mut BTreeMap<String, String>,
    key: &'static str,
) -> Result<Option<bool>, ConfigError> {
    match take_string(values, key) {
        Some(raw) => match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(ConfigError::InvalidValue {
                key,
                value: raw,
                expected: "a boolean",
            }),
        },
        None => Ok(None),
    }
}
