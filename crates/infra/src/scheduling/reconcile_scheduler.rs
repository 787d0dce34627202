//! Cron scheduler for reconciliation passes.
//!
//! Ticks that fire while the previous pass is still running are skipped, so
//! two passes never drain the queue at the same time.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use listsync_infra::scheduling::{ReconcileJob, ReconcileScheduler, SchedulerResult};
//!
//! # async fn example(job: Arc<dyn ReconcileJob>) -> SchedulerResult<()> {
//! let mut scheduler = ReconcileScheduler::new("0 */15 * * * *".into(), job).await?;
//!
//! scheduler.start().await?;
//! // ... until shutdown is requested ...
//! scheduler.stop().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use listsync_core::Reconciler;
use listsync_domain::ListSyncError;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_cron_scheduler::{Job, JobScheduler};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::scheduling::error::{SchedulerError, SchedulerResult};

/// One scheduled unit of work.
#[async_trait]
pub trait ReconcileJob: Send + Sync {
    async fn run(&self) -> Result<(), ListSyncError>;
}

#[async_trait]
impl ReconcileJob for Reconciler {
    async fn run(&self) -> Result<(), ListSyncError> {
        let report = Reconciler::run(self).await?;
        if report.has_failures() {
            warn!(cleared = report.cleared(), "reconcile.schedule.pass_with_failures");
        }
        Ok(())
    }
}

/// Configuration for the reconcile scheduler.
#[derive(Debug, Clone)]
pub struct ReconcileSchedulerConfig {
    /// Cron expression with a seconds field.
    pub cron_expression: String,
    /// Upper bound for a single pass.
    pub job_timeout: Duration,
    pub start_timeout: Duration,
    pub stop_timeout: Duration,
    /// Timeout for awaiting the monitor task join handle.
    pub join_timeout: Duration,
}

impl Default for ReconcileSchedulerConfig {
    fn default() -> Self {
        Self {
            cron_expression: "0 */15 * * * *".into(),
            job_timeout: Duration::from_secs(3600),
            start_timeout: Duration::from_secs(5),
            stop_timeout: Duration::from_secs(5),
            join_timeout: Duration::from_secs(5),
        }
    }
}

/// Clears the in-flight flag when a pass ends, including on timeout.
struct InFlight(Arc<AtomicBool>);

impl InFlight {
    fn try_enter(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(Arc::clone(flag)))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Reconcile scheduler with explicit lifecycle management.
pub struct ReconcileScheduler {
    scheduler: Arc<RwLock<JobScheduler>>,
    config: ReconcileSchedulerConfig,
    job_id: Uuid,
    monitor_handle: Option<JoinHandle<()>>,
    cancellation: CancellationToken,
    in_flight: Arc<AtomicBool>,
    job: Arc<dyn ReconcileJob>,
}

impl ReconcileScheduler {
    /// Create a scheduler with the default timeouts.
    pub async fn new(cron_expression: String, job: Arc<dyn ReconcileJob>) -> SchedulerResult<Self> {
        let config = ReconcileSchedulerConfig { cron_expression, ..Default::default() };
        Self::with_config(config, job).await
    }

    /// Create a scheduler with a custom configuration.
    ///
    /// Fails with [`SchedulerError::JobRegistrationFailed`] when the cron
    /// expression does not parse.
    pub async fn with_config(
        config: ReconcileSchedulerConfig,
        job: Arc<dyn ReconcileJob>,
    ) -> SchedulerResult<Self> {
        let raw_scheduler =
            JobScheduler::new().await.map_err(|source| SchedulerError::CreationFailed { source })?;

        let mut scheduler = Self {
            scheduler: Arc::new(RwLock::new(raw_scheduler)),
            config,
            job_id: Uuid::nil(),
            monitor_handle: None,
            cancellation: CancellationToken::new(),
            in_flight: Arc::new(AtomicBool::new(false)),
            job,
        };

        scheduler.job_id = scheduler.register_job().await?;
        Ok(scheduler)
    }

    #[instrument(skip(self))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        self.cancellation = CancellationToken::new();

        let scheduler = Arc::clone(&self.scheduler);
        let start_timeout = self.config.start_timeout;
        tokio::time::timeout(start_timeout, async move {
            let guard = scheduler.write().await;
            guard.start().await
        })
        .await
        .map_err(|source| SchedulerError::Timeout { duration: start_timeout, source })?
        .map_err(|source| SchedulerError::StartFailed { source })?;

        let cancel = self.cancellation.clone();
        self.monitor_handle = Some(tokio::spawn(Self::monitor_task(cancel)));

        info!(cron = %self.config.cron_expression, job_id = %self.job_id, "reconcile.schedule.started");
        Ok(())
    }

    /// Stop the scheduler. A pass already in flight is not interrupted.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        if !self.is_running() {
            return Err(SchedulerError::NotRunning);
        }

        self.cancellation.cancel();

        let scheduler = Arc::clone(&self.scheduler);
        let stop_timeout = self.config.stop_timeout;
        tokio::time::timeout(stop_timeout, async move {
            let mut guard = scheduler.write().await;
            guard.shutdown().await
        })
        .await
        .map_err(|source| SchedulerError::Timeout { duration: stop_timeout, source })?
        .map_err(|source| SchedulerError::StopFailed { source })?;

        if let Some(handle) = self.monitor_handle.take() {
            let join_timeout = self.config.join_timeout;
            tokio::time::timeout(join_timeout, handle)
                .await
                .map_err(|source| SchedulerError::Timeout { duration: join_timeout, source })??;
        }

        info!("reconcile.schedule.stopped");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.monitor_handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Whether a pass is executing right now.
    pub fn is_pass_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    async fn register_job(&mut self) -> SchedulerResult<Uuid> {
        if self.job_id != Uuid::nil() {
            return Ok(self.job_id);
        }

        let job = Arc::clone(&self.job);
        let in_flight = Arc::clone(&self.in_flight);
        let job_timeout = self.config.job_timeout;

        let job_definition = Job::new_async(self.config.cron_expression.as_str(), move |_id, _lock| {
            let job = Arc::clone(&job);
            let in_flight = Arc::clone(&in_flight);

            Box::pin(async move {
                let Some(_guard) = InFlight::try_enter(&in_flight) else {
                    warn!("reconcile.schedule.tick_skipped");
                    return;
                };
                let started = Instant::now();

                match tokio::time::timeout(job_timeout, job.run()).await {
                    Ok(Ok(())) => {
                        debug!(elapsed_ms = started.elapsed().as_millis(), "reconcile.schedule.pass_finished");
                    }
                    Ok(Err(err)) => {
                        error!(error = %err, "reconcile.schedule.pass_failed");
                    }
                    Err(_) => {
                        warn!(timeout_secs = job_timeout.as_secs(), "reconcile.schedule.pass_timed_out");
                    }
                }
            })
        })
        .map_err(|source| SchedulerError::JobRegistrationFailed { source })?;

        let job_id = job_definition.guid();
        let scheduler = self.scheduler.write().await;
        scheduler
            .add(job_definition)
            .await
            .map_err(|source| SchedulerError::JobRegistrationFailed { source })?;

        debug!(cron = %self.config.cron_expression, job_id = %job_id, "reconcile.schedule.job_registered");
        Ok(job_id)
    }

    async fn monitor_task(cancel: CancellationToken) {
        cancel.cancelled().await;
        debug!("reconcile.schedule.monitor_cancelled");
    }
}

impl Drop for ReconcileScheduler {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("reconcile.schedule.dropped_while_running");
            self.cancellation.cancel();
        }
    }
}
