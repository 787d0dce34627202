//! `status`

use std::sync::Arc;

use anyhow::{Context, Result};
use listsync_core::SubscriptionQueue;
use listsync_domain::{Config, QueueStats};
use listsync_infra::SqliteSubscriptionQueue;

use crate::context::open_database;

/// Print the queue depth. Works without network access.
pub async fn run(config: &Config, json: bool) -> Result<()> {
    let db = Arc::new(open_database(config)?);
    db.health_check().context("queue database is not healthy")?;

    let stats = SqliteSubscriptionQueue::new(db).stats().await.context("failed to read queue")?;
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print!("{}", render_stats(&stats));
    }
    Ok(())
}

fn render_stats(stats: &QueueStats) -> String {
    format!(
        "welcome subscribes: {}\nplain subscribes:   {}\nunsubscribes:       {}\ntotal:              {}\n",
        stats.welcome_subscribes,
        stats.plain_subscribes,
        stats.unsubscribes,
        stats.total()
    )
}
