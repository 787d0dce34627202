//! Configuration structures
//!
//! Values are loaded once by the infrastructure loader and handed to the
//! components that need them at construction time.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BATCH_SIZE, DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_PING_SENTINEL,
    DEFAULT_REQUEST_TIMEOUT_SECS, TRANSPORT_CONNECT_CODE, TRANSPORT_NAME_LOOKUP_CODE,
    TRANSPORT_TIMEOUT_CODE,
};
use crate::impl_domain_code_conversions;
use crate::{ListSyncError, Result};

/// Top-level application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub remote: RemoteConfig,
    #[serde(default)]
    pub subscribe: SubscribeOptions,
    #[serde(default)]
    pub reconcile: ReconcileConfig,
}

impl Config {
    /// Reject configurations that cannot produce a working engine.
    pub fn validate(&self) -> Result<()> {
        if self.database.path.trim().is_empty() {
            return Err(ListSyncError::Config("database.path must not be empty".into()));
        }
        if self.remote.api_url.trim().is_empty() {
            return Err(ListSyncError::Config("remote.api_url must not be empty".into()));
        }
        if self.remote.api_key.trim().is_empty() {
            return Err(ListSyncError::Config("remote.api_key must not be empty".into()));
        }
        if self.remote.list_id.trim().is_empty() {
            return Err(ListSyncError::Config("remote.list_id must not be empty".into()));
        }
        if self.reconcile.batch_size == 0 {
            return Err(ListSyncError::Config("reconcile.batch_size must be positive".into()));
        }
        Ok(())
    }
}

/// Local queue database settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

/// Remote list service settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Endpoint of the RPC API.
    pub api_url: String,
    pub api_key: String,
    /// Identifier of the list every call operates on.
    pub list_id: String,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_ping_sentinel")]
    pub ping_sentinel: String,
    #[serde(default)]
    pub transport_codes: TransportErrorCodes,
}

/// Transport error codes that indicate a transient failure.
///
/// The numbers are library specific, so they are configuration rather than
/// constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportErrorCodes {
    pub timeout: i32,
    pub connect: i32,
    pub name_lookup: i32,
}

impl TransportErrorCodes {
    /// Whether `code` is one of the transient transport failures.
    pub fn is_transient(&self, code: i32) -> bool {
        code == self.timeout || code == self.connect || code == self.name_lookup
    }
}

impl Default for TransportErrorCodes {
    fn default() -> Self {
        Self {
            timeout: TRANSPORT_TIMEOUT_CODE,
            connect: TRANSPORT_CONNECT_CODE,
            name_lookup: TRANSPORT_NAME_LOOKUP_CODE,
        }
    }
}

/// Email format a subscriber receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailType {
    #[default]
    Html,
    Text,
}

impl_domain_code_conversions!(EmailType {
    Html => "html",
    Text => "text",
});

/// Flags sent with every subscribe call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubscribeOptions {
    /// Require the member to confirm by email.
    pub double_opt_in: bool,
    /// Update existing members instead of rejecting them.
    pub update_existing: bool,
    /// Replace interest groups instead of merging them.
    pub replace_interests: bool,
    pub email_type: EmailType,
    /// Merge-field overrides applied on top of the default field map.
    pub field_overrides: BTreeMap<String, String>,
}

impl Default for SubscribeOptions {
    fn default() -> Self {
        Self {
            double_opt_in: false,
            update_existing: true,
            replace_interests: false,
            email_type: EmailType::Html,
            field_overrides: BTreeMap::new(),
        }
    }
}

/// Reconciliation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Chunk size for batch calls.
    pub batch_size: usize,
    /// Directory holding the instance PID file.
    pub lock_dir: String,
    /// Schedule used by `listsync schedule` (seconds-resolution cron).
    pub cron_expression: String,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            lock_dir: std::env::temp_dir().to_string_lossy().into_owned(),
            cron_expression: "0 */15 * * * *".into(),
        }
    }
}

fn default_pool_size() -> u32 {
    4
}

fn default_connect_timeout_ms() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_MS
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_ping_sentinel() -> String {
    DEFAULT_PING_SENTINEL.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> Config {
        Config {
            database: DatabaseConfig { path: "queue.db".into(), pool_size: 2 },
            remote: RemoteConfig {
                api_url: "https://us1.api.example.com/1.3/".into(),
                api_key: "key-us1".into(),
                list_id: "list-1".into(),
                connect_timeout_ms: 1000,
                request_timeout_secs: 30,
                ping_sentinel: DEFAULT_PING_SENTINEL.into(),
                transport_codes: TransportErrorCodes::default(),
            },
            subscribe: SubscribeOptions::default(),
            reconcile: ReconcileConfig::default(),
        }
    }

    #[test]
    fn transient_codes_match_defaults() {
        let codes = TransportErrorCodes::default();
        assert!(codes.is_transient(28));
        assert!(codes.is_transient(7));
        assert!(codes.is_transient(6));
        assert!(!codes.is_transient(35));
    }

    #[test]
    fn validate_accepts_complete_config() {
        assert!(sample_config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_missing_api_key() {
        let mut config = sample_config();
        config.remote.api_key = "  ".into();
        assert!(matches!(config.validate(), Err(ListSyncError::Config(msg)) if msg.contains("api_key")));
    }

    #[test]
    fn validate_rejects_zero_batch_size() {
        let mut config = sample_config();
        config.reconcile.batch_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn optional_sections_fall_back_to_defaults() {
        let json = r#"{
            "database": { "path": "queue.db" },
            "remote": { "api_url": "https://api", "api_key": "k", "list_id": "l" }
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.database.pool_size, 4);
        assert_eq!(config.remote.connect_timeout_ms, 1000);
        assert_eq!(config.remote.ping_sentinel, "Everything's Chimpy!");
        assert!(config.subscribe.update_existing);
        assert_eq!(config.reconcile.batch_size, 5000);
    }
}
