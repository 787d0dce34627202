//! In-memory queue store

use async_trait::async_trait;
use listsync_core::SubscriptionQueue;
use listsync_domain::{
    ListSyncError, QueueEntry, QueueStats, QueuedSubscriber, Result, SubscriberInfo,
};
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
struct SubscribeRow {
    address: String,
    info: SubscriberInfo,
    send_welcome: bool,
    revision: u64,
}

/// In-memory `SubscriptionQueue` with upsert-by-key semantics and per-row
/// revisions.
#[derive(Default)]
pub struct MemoryQueue {
    subscribes: Mutex<Vec<SubscribeRow>>,
    unsubscribes: Mutex<Vec<QueueEntry>>,
    failure: Mutex<Option<ListSyncError>>,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with `error`.
    pub async fn fail_with(&self, error: ListSyncError) {
        *self.failure.lock().await = Some(error);
    }

    /// Queued subscribe addresses for one welcome flag.
    pub async fn subscribe_addresses(&self, send_welcome: bool) -> Vec<String> {
        self.subscribes
            .lock()
            .await
            .iter()
            .filter(|row| row.send_welcome == send_welcome)
            .map(|row| row.address.clone())
            .collect()
    }

    pub async fn unsubscribe_addresses(&self) -> Vec<String> {
        self.unsubscribes.lock().await.iter().map(|entry| entry.address.clone()).collect()
    }

    /// Queued subscribe info for one key.
    pub async fn subscribe_info(&self, address: &str, send_welcome: bool) -> Option<SubscriberInfo> {
        self.subscribes
            .lock()
            .await
            .iter()
            .find(|row| row.address == address && row.send_welcome == send_welcome)
            .map(|row| row.info.clone())
    }

    pub async fn is_empty(&self) -> bool {
        self.subscribes.lock().await.is_empty() && self.unsubscribes.lock().await.is_empty()
    }

    async fn check(&self) -> Result<()> {
        match self.failure.lock().await.clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl SubscriptionQueue for MemoryQueue {
    async fn enqueue_subscribe(
        &self,
        address: &str,
        info: &SubscriberInfo,
        send_welcome: bool,
    ) -> Result<()> {
        self.check().await?;
        let mut rows = self.subscribes.lock().await;
        match rows.iter_mut().find(|row| row.address == address && row.send_welcome == send_welcome) {
            Some(row) => {
                row.info = info.clone();
                row.revision += 1;
            }
            None => rows.push(SubscribeRow {
                address: address.to_string(),
                info: info.clone(),
                send_welcome,
                revision: 0,
            }),
        }
        Ok(())
    }

    async fn enqueue_unsubscribe(&self, address: &str) -> Result<()> {
        self.check().await?;
        let mut rows = self.unsubscribes.lock().await;
        match rows.iter_mut().find(|row| row.address == address) {
            Some(row) => row.revision += 1,
            None => rows.push(QueueEntry::new(address, 0)),
        }
        Ok(())
    }

    async fn list_queued_subscribes(&self, send_welcome: bool) -> Result<Vec<QueuedSubscriber>> {
        self.check().await?;
        Ok(self
            .subscribes
            .lock()
            .await
            .iter()
            .filter(|row| row.send_welcome == send_welcome)
            .map(|row| {
                QueuedSubscriber::new(row.address.clone(), row.info.clone())
                    .with_revision(row.revision)
            })
            .collect())
    }

    async fn list_queued_unsubscribes(&self) -> Result<Vec<QueueEntry>> {
        self.check().await?;
        Ok(self.unsubscribes.lock().await.clone())
    }

    async fn delete_subscribes(&self, entries: &[QueueEntry], send_welcome: bool) -> Result<u64> {
        self.check().await?;
        let mut rows = self.subscribes.lock().await;
        let before = rows.len();
        rows.retain(|row| {
            row.send_welcome != send_welcome
                || !entries
                    .iter()
                    .any(|entry| entry.address == row.address && entry.revision == row.revision)
        });
        Ok((before - rows.len()) as u64)
    }

    async fn delete_unsubscribes(&self, entries: &[QueueEntry]) -> Result<u64> {
        self.check().await?;
        let mut rows = self.unsubscribes.lock().await;
        let before = rows.len();
        rows.retain(|row| !entries.contains(row));
        Ok((before - rows.len()) as u64)
    }

    async fn stats(&self) -> Result<QueueStats> {
        self.check().await?;
        let rows = self.subscribes.lock().await;
        let welcome = rows.iter().filter(|row| row.send_welcome).count() as u64;
        Ok(QueueStats {
            welcome_subscribes: welcome,
            plain_subscribes: rows.len() as u64 - welcome,
            unsubscribes: self.unsubscribes.lock().await.len() as u64,
        })
    }
}
