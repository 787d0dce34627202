//! `reconcile` and `schedule`

use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::{Context, Result};
use listsync_core::{ReconcileReport, StageAction, StageReport};
use listsync_domain::Config;
use listsync_infra::{InstanceLock, ReconcileScheduler};
use tracing::info;

use crate::context::AppContext;

/// Run one pass and print its report.
///
/// Partial failures are part of the report; only setup and queue store
/// errors make the command fail.
pub async fn run(config: &Config, dry_run: bool, json: bool) -> Result<()> {
    // Dry runs leave the queue alone and may overlap a real pass
    let _lock = if dry_run {
        None
    } else {
        Some(InstanceLock::acquire(&config.reconcile.lock_dir).context("failed to take instance lock")?)
    };

    let ctx = AppContext::build(config)?;
    let report = ctx.reconciler(dry_run).run().await.context("reconciliation aborted")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_report(&report));
    }
    Ok(())
}

/// Run passes on a cron schedule until Ctrl-C.
pub async fn schedule(config: &Config, cron: Option<String>) -> Result<()> {
    let _lock =
        InstanceLock::acquire(&config.reconcile.lock_dir).context("failed to take instance lock")?;

    let ctx = AppContext::build(config)?;
    let cron = cron.unwrap_or_else(|| config.reconcile.cron_expression.clone());
    let mut scheduler = ReconcileScheduler::new(cron, Arc::new(ctx.reconciler(false)))
        .await
        .context("failed to create scheduler")?;

    scheduler.start().await.context("failed to start scheduler")?;
    tokio::signal::ctrl_c().await.context("failed to listen for Ctrl-C")?;
    info!("reconcile.schedule.shutdown_requested");
    scheduler.stop().await.context("failed to stop scheduler")?;
    Ok(())
}

fn render_report(report: &ReconcileReport) -> String {
    let mut out = String::new();
    let availability = match report.available {
        Some(true) => "available",
        Some(false) => "unavailable, nothing drained",
        None => "not checked (dry run)",
    };
    let _ = writeln!(out, "remote list: {availability}");
    for stage in &report.stages {
        let _ = writeln!(out, "{}", render_stage(stage));
    }
    let _ = writeln!(out, "cleared: {}", report.cleared());
    out
}

fn render_stage(stage: &StageReport) -> String {
    let detail = match &stage.action {
        StageAction::Empty => "empty".to_string(),
        StageAction::DryRun => "dry run, queue kept".to_string(),
        StageAction::Requeued => "remote unavailable, queue kept".to_string(),
        StageAction::Cleared { deleted, result } => format!(
            "cleared {deleted} (succeeded {}, failed {})",
            result.success_count, result.error_count
        ),
        StageAction::Failed { reason } => format!("failed, queue kept: {reason}"),
    };
    format!("{:<20} {:>6} queued  {detail}", stage.stage.as_code(), stage.drained)
}
