//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. Reads a `.env` file from the working directory when one exists
//! 2. Attempts to load from environment variables
//! 3. If incomplete, falls back to loading from file
//! 4. Probes multiple paths for config files
//! 5. Supports JSON and TOML formats
//!
//! Every loaded configuration is validated before it is returned.
//!
//! ## Environment Variables
//! Required:
//! - `LISTSYNC_DB_PATH`: Queue database file path
//! - `LISTSYNC_API_URL`: Remote RPC endpoint
//! - `LISTSYNC_API_KEY`: Remote API key
//! - `LISTSYNC_LIST_ID`: Remote list identifier
//!
//! Optional:
//! - `LISTSYNC_DB_POOL_SIZE`: Connection pool size
//! - `LISTSYNC_CONNECT_TIMEOUT_MS`, `LISTSYNC_REQUEST_TIMEOUT_SECS`
//! - `LISTSYNC_PING_SENTINEL`: Expected health-check reply
//! - `LISTSYNC_DOUBLE_OPT_IN`, `LISTSYNC_UPDATE_EXISTING`,
//!   `LISTSYNC_REPLACE_INTERESTS` (true/false)
//! - `LISTSYNC_EMAIL_TYPE`: `html` or `text`
//! - `LISTSYNC_BATCH_SIZE`: Chunk size for batch calls
//! - `LISTSYNC_LOCK_DIR`: Directory for the instance PID file
//! - `LISTSYNC_CRON`: Reconciliation schedule
//!
//! Transport error codes and merge-field overrides are only read from files.
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./listsync.toml`, `./listsync.json`, `./config.toml`, `./config.json`
//! 2. The same names in the parent directory
//! 3. The same names next to the executable

use std::path::{Path, PathBuf};
use std::str::FromStr;

use listsync_domain::{
    Config, DatabaseConfig, EmailType, ListSyncError, ReconcileConfig, RemoteConfig, Result,
    SubscribeOptions, TransportErrorCodes,
};

const CONFIG_FILE_NAMES: [&str; 4] = ["listsync.toml", "listsync.json", "config.toml", "config.json"];

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `ListSyncError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - Required fields are missing or fail validation
pub fn load() -> Result<Config> {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "config.dotenv.loaded");
    }

    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// # Errors
/// Returns `ListSyncError::Config` if required variables are missing
/// or have invalid values.
pub fn load_from_env() -> Result<Config> {
    let defaults = SubscribeOptions::default();
    let reconcile_defaults = ReconcileConfig::default();

    let config = Config {
        database: DatabaseConfig {
            path: env_var("LISTSYNC_DB_PATH")?,
            pool_size: env_parse("LISTSYNC_DB_POOL_SIZE", 4)?,
        },
        remote: RemoteConfig {
            api_url: env_var("LISTSYNC_API_URL")?,
            api_key: env_var("LISTSYNC_API_KEY")?,
            list_id: env_var("LISTSYNC_LIST_ID")?,
            connect_timeout_ms: env_parse(
                "LISTSYNC_CONNECT_TIMEOUT_MS",
                listsync_domain::constants::DEFAULT_CONNECT_TIMEOUT_MS,
            )?,
            request_timeout_secs: env_parse(
                "LISTSYNC_REQUEST_TIMEOUT_SECS",
                listsync_domain::constants::DEFAULT_REQUEST_TIMEOUT_SECS,
            )?,
            ping_sentinel: std::env::var("LISTSYNC_PING_SENTINEL").unwrap_or_else(|_| {
                listsync_domain::constants::DEFAULT_PING_SENTINEL.to_string()
            }),
            transport_codes: TransportErrorCodes::default(),
        },
        subscribe: SubscribeOptions {
            double_opt_in: env_bool("LISTSYNC_DOUBLE_OPT_IN", defaults.double_opt_in),
            update_existing: env_bool("LISTSYNC_UPDATE_EXISTING", defaults.update_existing),
            replace_interests: env_bool("LISTSYNC_REPLACE_INTERESTS", defaults.replace_interests),
            email_type: env_parse::<EmailType>("LISTSYNC_EMAIL_TYPE", defaults.email_type)?,
            field_overrides: defaults.field_overrides,
        },
        reconcile: ReconcileConfig {
            batch_size: env_parse("LISTSYNC_BATCH_SIZE", reconcile_defaults.batch_size)?,
            lock_dir: std::env::var("LISTSYNC_LOCK_DIR").unwrap_or(reconcile_defaults.lock_dir),
            cron_expression: std::env::var("LISTSYNC_CRON")
                .unwrap_or(reconcile_defaults.cron_expression),
        },
    };

    validate(&config)?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `ListSyncError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - Required fields are missing or fail validation
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ListSyncError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            ListSyncError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| ListSyncError::Config(format!("Failed to read config file: {}", e)))?;

    let config = parse_config(&contents, &config_path)?;
    validate(&config)?;
    Ok(config)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| ListSyncError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| ListSyncError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(ListSyncError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Domain validation plus a well-formed endpoint URL.
fn validate(config: &Config) -> Result<()> {
    config.validate()?;
    let url = url::Url::parse(&config.remote.api_url)
        .map_err(|e| ListSyncError::Config(format!("Invalid remote.api_url: {}", e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ListSyncError::Config(format!(
            "remote.api_url must be http or https, got {}",
            url.scheme()
        )));
    }
    Ok(())
}

/// Probe multiple paths for configuration files
///
/// Searches the current working directory, its parent and the executable's
/// directory for the standard file names.
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd.clone());
        dirs.push(cwd.join(".."));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            dirs.push(exe_dir.to_path_buf());
        }
    }

    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

/// Get required environment variable
///
/// # Errors
/// Returns `ListSyncError::Config` if the variable is not set.
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        ListSyncError::Config(format!("Missing required environment variable: {}", key))
    })
}

/// Parse an optional environment variable, falling back to `default`.
fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ListSyncError::Config(format!("Invalid value for {}: {}", key, e))),
        Err(_) => Ok(default),
    }
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
