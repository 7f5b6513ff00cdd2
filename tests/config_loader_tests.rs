use reposync::config::{ConfigError, ConfigLoader, ServerMode};
use std::{
    env, fs,
    path::PathBuf,
    sync::{Mutex, MutexGuard, OnceLock},
};
use tempfile::TempDir;

fn env_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

fn env_guard() -> MutexGuard<'static, ()> {
    env_lock()
        .lock()
        .unwrap_or_else(|poison| poison.into_inner())
}

const KEYS: &[&str] = &[
    "REPOSYNC_PROFILE",
    "REPOSYNC_SERVER_HTTP_HOST",
    "REPOSYNC_SERVER_HTTP_PORT",
    "REPOSYNC_SERVER_HTTP_ENABLE",
    "REPOSYNC_SERVER_RPC_ADDRESS",
    "REPOSYNC_SERVER_RPC_ENABLE",
    "REPOSYNC_GITHUB_TOKEN",
    "REPOSYNC_GITHUB_REPOSITORIES",
    "REPOSYNC_GITHUB_API_BASE",
    "REPOSYNC_DATABASE_PATH",
    "REPOSYNC_DB_MAX_CONNECTIONS",
    "REPOSYNC_LOG_LEVEL",
    "REPOSYNC_LOG_FORMAT",
];

fn clear_env() {
    for key in KEYS {
        unsafe {
            env::remove_var(key);
        }
    }
}

fn write_env_file(dir: &TempDir, name: &str, contents: &str) {
    let path = dir.path().join(name);
    fs::write(path, contents).unwrap();
}

#[test]
fn loads_defaults_when_no_env_present() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    let cfg = ConfigLoader::with_base_dir(temp_dir.path().to_path_buf())
        .load()
        .expect("config loads with defaults");

    assert_eq!(cfg.profile, "local");
    assert_eq!(cfg.server.http_host, "0.0.0.0");
    assert_eq!(cfg.server.http_port, 8080);
    assert!(cfg.server.http_enable);
    assert!(cfg.server.rpc_enable);
    assert_eq!(cfg.server.rpc_address, PathBuf::from("./data/reposync.sock"));
    assert_eq!(cfg.database_path, PathBuf::from("./data/reposync.db"));
    assert_eq!(cfg.github.api_base, "https://api.github.com");
    assert!(cfg.github.repositories.is_empty());
    assert_eq!(cfg.log_level, "info");
    cfg.http_bind_addr().expect("default bind addr parses");
}

#[test]
fn layered_env_files_apply_in_order() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(&temp_dir, ".env", "REPOSYNC_SERVER_HTTP_PORT=3000\n");
    write_env_file(&temp_dir, ".env.test", "REPOSYNC_SERVER_HTTP_PORT=5000\n");
    write_env_file(
        &temp_dir,
        ".env.test.local",
        "REPOSYNC_SERVER_HTTP_PORT=6000\n",
    );

    // Select profile via .env.local before profile-specific files load.
    write_env_file(
        &temp_dir,
        ".env.local",
        "REPOSYNC_PROFILE=test\nREPOSYNC_SERVER_HTTP_PORT=4000\n",
    );

    let cfg = ConfigLoader::with_base_dir(temp_dir.path().to_path_buf())
        .load()
        .expect("layered config loads");

    assert_eq!(cfg.profile, "test");
    assert_eq!(cfg.server.http_port, 6000);
}

#[test]
fn process_env_overrides_files() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(
        &temp_dir,
        ".env",
        "REPOSYNC_GITHUB_REPOSITORIES=octo/one\nREPOSYNC_LOG_LEVEL=warn\n",
    );
    unsafe {
        env::set_var(
            "REPOSYNC_GITHUB_REPOSITORIES",
            "https://github.com/octo/two, octo/three ,",
        );
    }

    let cfg = ConfigLoader::with_base_dir(temp_dir.path().to_path_buf())
        .load()
        .expect("config loads");

    assert_eq!(
        cfg.github.repositories,
        vec!["https://github.com/octo/two", "octo/three"]
    );
    assert_eq!(cfg.log_level, "warn");
    clear_env();
}

#[test]
fn placeholder_token_counts_as_absent() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(
        &temp_dir,
        ".env",
        "REPOSYNC_GITHUB_TOKEN=your_github_token_here\n",
    );

    let cfg = ConfigLoader::with_base_dir(temp_dir.path().to_path_buf())
        .load()
        .expect("config loads");

    assert!(cfg.github.effective_token().is_none());
    let redacted = cfg.redacted_json().unwrap();
    assert!(!redacted.contains("your_github_token_here"));
}

#[test]
fn invalid_port_is_rejected() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(&temp_dir, ".env", "REPOSYNC_SERVER_HTTP_PORT=http\n");

    let err = ConfigLoader::with_base_dir(temp_dir.path().to_path_buf())
        .load()
        .unwrap_err();

    assert!(matches!(
        err,
        ConfigError::InvalidValue {
            key: "SERVER_HTTP_PORT",
            ..
        }
    ));
}

#[test]
fn disabling_every_front_end_is_rejected() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(
        &temp_dir,
        ".env",
        "REPOSYNC_SERVER_HTTP_ENABLE=false\nREPOSYNC_SERVER_RPC_ENABLE=false\n",
    );

    let err = ConfigLoader::with_base_dir(temp_dir.path().to_path_buf())
        .load()
        .unwrap_err();

    assert!(matches!(err, ConfigError::NoFrontEndEnabled));
}

#[test]
fn server_mode_overrides_disabled_switches_before_validation() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(
        &temp_dir,
        ".env",
        "REPOSYNC_SERVER_HTTP_ENABLE=false\nREPOSYNC_SERVER_RPC_ENABLE=false\n",
    );
    let loader = ConfigLoader::with_base_dir(temp_dir.path().to_path_buf());

    let cfg = loader
        .load_with_mode(Some(ServerMode::Http))
        .expect("--server http wins over disabled switches");
    assert!(cfg.server.http_enable);
    assert!(!cfg.server.rpc_enable);

    assert!(matches!(
        loader.load_with_mode(None),
        Err(ConfigError::NoFrontEndEnabled)
    ));
}
