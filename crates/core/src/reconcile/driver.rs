//! Reconciliation driver
//!
//! Each stage snapshots its queue, hands the snapshot to the matching batch
//! operation and clears exactly the snapshot entries that did not go back
//! into the queue. Clears match on address and revision, so rows enqueued or
//! refreshed after the snapshot are never touched.

use std::collections::HashSet;
use std::sync::Arc;

use listsync_domain::{BatchOutcome, BatchResult, QueueEntry, QueuedSubscriber, Result};
use tracing::{debug, error, info, instrument, warn};

use super::report::{DrainStage, ReconcileReport, StageAction, StageReport};
use crate::list::{FieldOverrides, ListError, MailingList};
use crate::queue::SubscriptionQueue;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Log the pending work without calling the remote service or touching
    /// the queue.
    pub dry_run: bool,
    /// Merge-field overrides for queued subscribes.
    pub field_overrides: FieldOverrides,
}

/// Result of a batch call as seen by a drain stage.
enum Settled {
    Clear { entries: Vec<QueueEntry>, result: BatchResult },
    Keep(StageAction),
}

/// Drains the local queue into the remote list.
pub struct Reconciler {
    list: Arc<dyn MailingList>,
    queue: Arc<dyn SubscriptionQueue>,
    options: ReconcileOptions,
}

impl Reconciler {
    pub fn new(
        list: Arc<dyn MailingList>,
        queue: Arc<dyn SubscriptionQueue>,
        options: ReconcileOptions,
    ) -> Self {
        Self { list, queue, options }
    }

    /// Run one pass.
    ///
    /// Batch failures are recorded per stage and do not stop the pass; only
    /// queue store errors are returned.
    #[instrument(skip(self), fields(dry_run = self.options.dry_run))]
    pub async fn run(&self) -> Result<ReconcileReport> {
        let mut report = ReconcileReport::new(self.options.dry_run);

        if !self.options.dry_run {
            let available = self.list.is_available().await;
            report.available = Some(available);
            if !available {
                warn!("reconcile.unavailable");
                return Ok(report);
            }
        }

        for stage in DrainStage::ALL {
            let stage_report = match stage {
                DrainStage::WelcomeSubscribes => self.drain_subscribes(stage, true).await?,
                DrainStage::PlainSubscribes => self.drain_subscribes(stage, false).await?,
                DrainStage::Unsubscribes => self.drain_unsubscribes().await?,
            };
            report.stages.push(stage_report);
        }

        info!(
            cleared = report.cleared(),
            failures = report.has_failures(),
            "reconcile.completed"
        );
        Ok(report)
    }

    async fn drain_subscribes(&self, stage: DrainStage, send_welcome: bool) -> Result<StageReport> {
        let snapshot = self.queue.list_queued_subscribes(send_welcome).await?;
        let drained = snapshot.len();
        if let Some(action) = self.skip_stage(stage, snapshot.iter().map(|s| s.address.as_str())) {
            return Ok(StageReport::new(stage, drained, action));
        }

        let outcome = self
            .list
            .batch_subscribe(&snapshot, send_welcome, &self.options.field_overrides)
            .await;
        let entries = snapshot.iter().map(QueuedSubscriber::entry);

        let action = match settle(stage, entries, outcome)? {
            Settled::Keep(action) => action,
            Settled::Clear { entries, result } => {
                let deleted = self.queue.delete_subscribes(&entries, send_welcome).await?;
                info!(stage = %stage, deleted, "reconcile.stage.cleared");
                StageAction::Cleared { deleted, result }
            }
        };
        Ok(StageReport::new(stage, drained, action))
    }

    async fn drain_unsubscribes(&self) -> Result<StageReport> {
        let stage = DrainStage::Unsubscribes;
        let snapshot = self.queue.list_queued_unsubscribes().await?;
        let drained = snapshot.len();
        if let Some(action) =
            self.skip_stage(stage, snapshot.iter().map(|entry| entry.address.as_str()))
        {
            return Ok(StageReport::new(stage, drained, action));
        }

        let addresses: Vec<String> = snapshot.iter().map(|entry| entry.address.clone()).collect();
        let outcome = self.list.batch_unsubscribe(&addresses).await;

        let action = match settle(stage, snapshot.into_iter(), outcome)? {
            Settled::Keep(action) => action,
            Settled::Clear { entries, result } => {
                let deleted = self.queue.delete_unsubscribes(&entries).await?;
                info!(stage = %stage, deleted, "reconcile.stage.cleared");
                StageAction::Cleared { deleted, result }
            }
        };
        Ok(StageReport::new(stage, drained, action))
    }

    /// Short-circuit empty snapshots and dry runs.
    fn skip_stage<'a>(
        &self,
        stage: DrainStage,
        addresses: impl ExactSizeIterator<Item = &'a str>,
    ) -> Option<StageAction> {
        let count = addresses.len();
        if count == 0 {
            info!(stage = %stage, "reconcile.stage.empty");
            return Some(StageAction::Empty);
        }
        if self.options.dry_run {
            for address in addresses {
                debug!(stage = %stage, address = %address, "reconcile.stage.pending");
            }
            info!(stage = %stage, count, "reconcile.stage.dry_run");
            return Some(StageAction::DryRun);
        }
        None
    }
}

/// Decide what to clear after a batch call.
fn settle(
    stage: DrainStage,
    snapshot: impl Iterator<Item = QueueEntry>,
    outcome: std::result::Result<BatchOutcome, ListError>,
) -> Result<Settled> {
    match outcome {
        Ok(BatchOutcome::Completed(result)) => {
            let requeued: HashSet<&str> = result.requeued_addresses().collect();
            let entries: Vec<QueueEntry> =
                snapshot.filter(|entry| !requeued.contains(entry.address.as_str())).collect();
            if !requeued.is_empty() {
                info!(stage = %stage, requeued = requeued.len(), "reconcile.stage.partially_requeued");
            }
            Ok(Settled::Clear { entries, result })
        }
        Ok(BatchOutcome::Queued) => {
            warn!(stage = %stage, "reconcile.stage.requeued");
            Ok(Settled::Keep(StageAction::Requeued))
        }
        Err(ListError::Queue(err)) => Err(err),
        Err(err) => {
            error!(stage = %stage, error = %err, "reconcile.stage.failed");
            Ok(Settled::Keep(StageAction::Failed { reason: err.to_string() }))
        }
    }
}
