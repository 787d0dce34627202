//! SQLite-backed implementation of the subscription queue port.
//!
//! Subscribes are keyed by `(email, send_welcome)` and unsubscribes by
//! `email`; enqueueing an existing key refreshes its payload and bumps its
//! revision but keeps its place in the queue. Deletes match on
//! `(email, revision)`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use listsync_core::SubscriptionQueue;
use listsync_domain::{
    ListSyncError, QueueEntry, QueueStats, QueuedSubscriber, Result as DomainResult,
    SubscriberInfo,
};
use rusqlite::{params, Connection, Row};
use tokio::task;
use tracing::{debug, warn};

use super::manager::{map_sql_error, DbManager};
use crate::errors::InfraError;

/// SQLite-backed subscription queue.
pub struct SqliteSubscriptionQueue {
    db: Arc<DbManager>,
}

impl SqliteSubscriptionQueue {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    fn upsert_subscribe(
        conn: &Connection,
        address: &str,
        info_json: &str,
        send_welcome: bool,
    ) -> DomainResult<()> {
        conn.execute(SUBSCRIBE_UPSERT_SQL, params![
            address,
            bool_to_int(send_welcome),
            info_json,
            Utc::now().timestamp_millis()
        ])
        .map(|_| ())
        .map_err(map_sql_error)
    }

    fn fetch_subscribes(
        conn: &Connection,
        send_welcome: bool,
    ) -> DomainResult<Vec<QueuedSubscriber>> {
        let mut stmt = conn.prepare(SUBSCRIBE_LIST_SQL).map_err(map_sql_error)?;
        let rows = stmt
            .query_map(params![bool_to_int(send_welcome)], map_subscribe_row)
            .map_err(map_sql_error)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(map_sql_error)
    }

    fn fetch_unsubscribes(conn: &Connection) -> DomainResult<Vec<QueueEntry>> {
        let mut stmt = conn.prepare(UNSUBSCRIBE_LIST_SQL).map_err(map_sql_error)?;
        let rows = stmt.query_map([], map_unsubscribe_row).map_err(map_sql_error)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(map_sql_error)
    }

    /// Delete the snapshotted `entries` from `table` in one transaction.
    /// `filter` is an extra constant condition on the rows.
    fn delete_entries(
        conn: &mut Connection,
        table: &str,
        filter: &str,
        entries: &[QueueEntry],
    ) -> DomainResult<u64> {
        let sql = format!("DELETE FROM {table} WHERE {filter} email = ?1 AND revision = ?2");
        let tx = conn.transaction().map_err(map_sql_error)?;
        let mut deleted = 0_u64;
        {
            let mut stmt = tx.prepare(&sql).map_err(map_sql_error)?;
            for entry in entries {
                let removed = stmt
                    .execute(params![entry.address, u64_to_i64(entry.revision)])
                    .map_err(map_sql_error)?;
                deleted = deleted.saturating_add(usize_to_u64(removed));
            }
        }
        tx.commit().map_err(map_sql_error)?;
        Ok(deleted)
    }

    fn read_stats(conn: &Connection) -> DomainResult<QueueStats> {
        let mut stats = QueueStats::default();

        let mut stmt = conn.prepare(SUBSCRIBE_COUNT_SQL).map_err(map_sql_error)?;
        let counts = stmt
            .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)))
            .map_err(map_sql_error)?;
        for count in counts {
            let (send_welcome, count) = count.map_err(map_sql_error)?;
            if int_to_bool(send_welcome) {
                stats.welcome_subscribes = i64_to_u64(count);
            } else {
                stats.plain_subscribes = i64_to_u64(count);
            }
        }

        let unsubscribes: i64 = conn
            .query_row("SELECT COUNT(*) FROM unsubscribe_queue", [], |row| row.get(0))
            .map_err(map_sql_error)?;
        stats.unsubscribes = i64_to_u64(unsubscribes);

        Ok(stats)
    }

    async fn run<T, F>(&self, op: F) -> DomainResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> DomainResult<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> DomainResult<T> {
            let mut conn = db.get_connection()?;
            op(&mut *conn)
        })
        .await
        .map_err(map_join_error)?
    }
}

#[async_trait]
impl SubscriptionQueue for SqliteSubscriptionQueue {
    async fn enqueue_subscribe(
        &self,
        address: &str,
        info: &SubscriberInfo,
        send_welcome: bool,
    ) -> DomainResult<()> {
        let address = address.to_string();
        let info_json = serde_json::to_string(info).map_err(InfraError::from)?;
        self.run(move |conn| Self::upsert_subscribe(conn, &address, &info_json, send_welcome))
            .await
    }

    async fn enqueue_unsubscribe(&self, address: &str) -> DomainResult<()> {
        let address = address.to_string();
        self.run(move |conn| {
            conn.execute(UNSUBSCRIBE_UPSERT_SQL, params![address, Utc::now().timestamp_millis()])
                .map(|_| ())
                .map_err(map_sql_error)
        })
        .await
    }

    async fn list_queued_subscribes(
        &self,
        send_welcome: bool,
    ) -> DomainResult<Vec<QueuedSubscriber>> {
        self.run(move |conn| Self::fetch_subscribes(conn, send_welcome)).await
    }

    async fn list_queued_unsubscribes(&self) -> DomainResult<Vec<QueueEntry>> {
        self.run(|conn| Self::fetch_unsubscribes(conn)).await
    }

    async fn delete_subscribes(
        &self,
        entries: &[QueueEntry],
        send_welcome: bool,
    ) -> DomainResult<u64> {
        if entries.is_empty() {
            return Ok(0);
        }
        let entries = entries.to_vec();
        let deleted = self
            .run(move |conn| {
                let filter = format!("send_welcome = {} AND", bool_to_int(send_welcome));
                Self::delete_entries(conn, "subscribe_queue", &filter, &entries)
            })
            .await?;
        debug!(deleted, send_welcome, "queue.subscribes.deleted");
        Ok(deleted)
    }

    async fn delete_unsubscribes(&self, entries: &[QueueEntry]) -> DomainResult<u64> {
        if entries.is_empty() {
            return Ok(0);
        }
        let entries = entries.to_vec();
        let deleted = self
            .run(move |conn| Self::delete_entries(conn, "unsubscribe_queue", "", &entries))
            .await?;
        debug!(deleted, "queue.unsubscribes.deleted");
        Ok(deleted)
    }

    async fn stats(&self) -> DomainResult<QueueStats> {
        self.run(|conn| Self::read_stats(conn)).await
    }
}

const SUBSCRIBE_UPSERT_SQL: &str = "INSERT INTO subscribe_queue (email, send_welcome, info_json, queued_at)
    VALUES (?1, ?2, ?3, ?4)
    ON CONFLICT (email, send_welcome) DO UPDATE SET
        info_json = excluded.info_json,
        revision = subscribe_queue.revision + 1";

const UNSUBSCRIBE_UPSERT_SQL: &str = "INSERT INTO unsubscribe_queue (email, queued_at)
    VALUES (?1, ?2)
    ON CONFLICT (email) DO UPDATE SET revision = unsubscribe_queue.revision + 1";

const SUBSCRIBE_LIST_SQL: &str = "SELECT email, info_json, revision
    FROM subscribe_queue
    WHERE send_welcome = ?1
    ORDER BY queued_at ASC, id ASC";

const UNSUBSCRIBE_LIST_SQL: &str = "SELECT email, revision
    FROM unsubscribe_queue
    ORDER BY queued_at ASC, id ASC";

const SUBSCRIBE_COUNT_SQL: &str =
    "SELECT send_welcome, COUNT(*) FROM subscribe_queue GROUP BY send_welcome";

fn map_subscribe_row(row: &Row<'_>) -> rusqlite::Result<QueuedSubscriber> {
    let address: String = row.get(0)?;
    let info_raw: String = row.get(1)?;
    let revision: i64 = row.get(2)?;
    let info = parse_info(&address, &info_raw);
    Ok(QueuedSubscriber::new(address, info).with_revision(i64_to_u64(revision)))
}

fn map_unsubscribe_row(row: &Row<'_>) -> rusqlite::Result<QueueEntry> {
    let address: String = row.get(0)?;
    let revision: i64 = row.get(1)?;
    Ok(QueueEntry::new(address, i64_to_u64(revision)))
}

fn parse_info(address: &str, raw: &str) -> SubscriberInfo {
    match serde_json::from_str(raw) {
        Ok(info) => info,
        Err(err) => {
            warn!(
                address = %address,
                error = %err,
                "queue.subscribe.info_invalid"
            );
            SubscriberInfo::new()
        }
    }
}

fn map_join_error(err: task::JoinError) -> ListSyncError {
    if err.is_cancelled() {
        ListSyncError::Internal("queue task cancelled".into())
    } else {
        ListSyncError::Internal(format!("queue task panic: {err}"))
    }
}

fn bool_to_int(value: bool) -> i64 {
    i64::from(value)
}

fn int_to_bool(value: i64) -> bool {
    value != 0
}

fn i64_to_u64(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

fn u64_to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn usize_to_u64(value: usize) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}
