//! Wiring of configuration, queue store and list service

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use listsync_core::{ListService, ListServiceConfig, ReconcileOptions, Reconciler};
use listsync_domain::Config;
use listsync_infra::{config, DbManager, JsonRpcListClient, SqliteSubscriptionQueue};

pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => config::load_from_file(Some(path.to_path_buf())),
        None => config::load(),
    };
    config.context("failed to load configuration")
}

/// Everything a command needs, built from one [`Config`].
pub struct AppContext {
    pub queue: Arc<SqliteSubscriptionQueue>,
    pub list: Arc<ListService>,
}

impl AppContext {
    pub fn build(config: &Config) -> Result<Self> {
        let db = Arc::new(open_database(config)?);
        let queue = Arc::new(SqliteSubscriptionQueue::new(db));

        let client = JsonRpcListClient::new(&config.remote)
            .context("failed to create remote list client")?;
        let list = ListService::new(Arc::new(client), ListServiceConfig::from(config))
            .with_queue(queue.clone());

        Ok(Self { queue, list: Arc::new(list) })
    }

    pub fn reconciler(&self, dry_run: bool) -> Reconciler {
        let options = ReconcileOptions { dry_run, ..ReconcileOptions::default() };
        Reconciler::new(self.list.clone(), self.queue.clone(), options)
    }
}

pub fn open_database(config: &Config) -> Result<DbManager> {
    let db = DbManager::new(&config.database.path, config.database.pool_size)
        .with_context(|| format!("failed to open queue database {}", config.database.path))?;
    db.run_migrations().context("failed to migrate queue database")?;
    Ok(db)
}
