//! Port interface for the durable intent queue

use async_trait::async_trait;
use listsync_domain::{QueueEntry, QueueStats, QueuedSubscriber, Result, SubscriberInfo};

/// Durable, ordered store of subscribe and unsubscribe intents.
///
/// Subscribes are keyed by `(address, send_welcome)` and unsubscribes by
/// address. Enqueueing an existing key overwrites it and bumps its revision.
#[async_trait]
pub trait SubscriptionQueue: Send + Sync {
    async fn enqueue_subscribe(
        &self,
        address: &str,
        info: &SubscriberInfo,
        send_welcome: bool,
    ) -> Result<()>;

    async fn enqueue_unsubscribe(&self, address: &str) -> Result<()>;

    /// Queued subscribes for one welcome flag, oldest first.
    async fn list_queued_subscribes(&self, send_welcome: bool) -> Result<Vec<QueuedSubscriber>>;

    /// Queued unsubscribes, oldest first.
    async fn list_queued_unsubscribes(&self) -> Result<Vec<QueueEntry>>;

    /// Delete the given subscribe rows atomically; returns the number removed.
    ///
    /// A row only matches when both address and revision match, so rows
    /// enqueued or refreshed after the caller's snapshot are left alone.
    async fn delete_subscribes(&self, entries: &[QueueEntry], send_welcome: bool) -> Result<u64>;

    /// Delete the given unsubscribe rows atomically; returns the number removed.
    async fn delete_unsubscribes(&self, entries: &[QueueEntry]) -> Result<u64>;

    async fn stats(&self) -> Result<QueueStats>;
}
