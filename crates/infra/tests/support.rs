#![allow(dead_code)]

use std::sync::{Arc, Once};

use listsync_domain::constants::DEFAULT_PING_SENTINEL;
use listsync_domain::{RemoteConfig, TransportErrorCodes};
use listsync_infra::database::{DbManager, SqliteSubscriptionQueue};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const LIST_ID: &str = "list-1";

/// Temporary migrated database that lives as long as the value.
pub struct TestDatabase {
    pub manager: Arc<DbManager>,
    _temp_dir: TempDir,
}

impl TestDatabase {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir should be created");
        let manager =
            DbManager::new(temp_dir.path().join("queue.db"), 2).expect("db manager should be created");
        manager.run_migrations().expect("migrations should run");

        Self { manager: Arc::new(manager), _temp_dir: temp_dir }
    }

    pub fn queue(&self) -> Arc<SqliteSubscriptionQueue> {
        Arc::new(SqliteSubscriptionQueue::new(Arc::clone(&self.manager)))
    }
}

impl Default for TestDatabase {
    fn default() -> Self {
        Self::new()
    }
}

pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("listsync=debug")
            .with_test_writer()
            .try_init();
    });
}

pub fn remote_config(base_uri: &str) -> RemoteConfig {
    RemoteConfig {
        api_url: format!("{base_uri}/1.3/"),
        api_key: "key-us1".to_string(),
        list_id: LIST_ID.to_string(),
        connect_timeout_ms: 500,
        request_timeout_secs: 5,
        ping_sentinel: DEFAULT_PING_SENTINEL.to_string(),
        transport_codes: TransportErrorCodes::default(),
    }
}

/// Endpoint on localhost that refuses connections.
pub fn unreachable_uri() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{addr}")
}

pub async fn mount_healthy_ping(server: &MockServer) {
    Mock::given(method("POST"))
        .and(query_param("method", "ping"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(DEFAULT_PING_SENTINEL)))
        .mount(server)
        .await;
}

/// Number of requests the server saw for one RPC method.
pub async fn calls_to(server: &MockServer, rpc_method: &str) -> usize {
    let needle = format!("method={rpc_method}&");
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.query().is_some_and(|query| format!("{query}&").contains(&needle)))
        .count()
}
