//! Reconciliation pass reports

use listsync_domain::{impl_domain_code_conversions, BatchResult};
use serde::Serialize;

/// One drain stage of a pass, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DrainStage {
    WelcomeSubscribes,
    PlainSubscribes,
    Unsubscribes,
}

impl_domain_code_conversions!(DrainStage {
    WelcomeSubscribes => "welcome_subscribes",
    PlainSubscribes => "plain_subscribes",
    Unsubscribes => "unsubscribes",
});

impl DrainStage {
    pub const ALL: [Self; 3] = [Self::WelcomeSubscribes, Self::PlainSubscribes, Self::Unsubscribes];
}

/// What a stage did with its snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum StageAction {
    /// Nothing was queued.
    Empty,
    /// Dry run: the snapshot was only logged.
    DryRun,
    /// The remote service became unavailable and the batch went back to the
    /// queue; nothing was cleared.
    Requeued,
    /// The batch completed and `deleted` rows were cleared.
    Cleared { deleted: u64, result: BatchResult },
    /// The batch failed fatally; nothing was cleared.
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageReport {
    pub stage: DrainStage,
    /// Size of the snapshot taken at the start of the stage.
    pub drained: usize,
    pub action: StageAction,
}

impl StageReport {
    pub const fn new(stage: DrainStage, drained: usize, action: StageAction) -> Self {
        Self { stage, drained, action }
    }
}

/// Summary of one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Probe result; `None` for dry runs, which never contact the remote
    /// service.
    pub available: Option<bool>,
    pub dry_run: bool,
    pub stages: Vec<StageReport>,
}

impl ReconcileReport {
    pub const fn new(dry_run: bool) -> Self {
        Self { available: None, dry_run, stages: Vec::new() }
    }

    pub fn stage(&self, stage: DrainStage) -> Option<&StageReport> {
        self.stages.iter().find(|report| report.stage == stage)
    }

    /// Total rows removed from the queue.
    pub fn cleared(&self) -> u64 {
        self.stages
            .iter()
            .map(|report| match &report.action {
                StageAction::Cleared { deleted, .. } => *deleted,
                _ => 0,
            })
            .sum()
    }

    pub fn has_failures(&self) -> bool {
        self.stages.iter().any(|report| matches!(report.action, StageAction::Failed { .. }))
    }
}
