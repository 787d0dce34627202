//! Scheduler error types

use std::time::Duration;

use listsync_domain::ListSyncError;
use thiserror::Error;
use tokio_cron_scheduler::JobSchedulerError;

use crate::errors::InfraError;

/// Scheduler-specific errors
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Scheduler already running")]
    AlreadyRunning,

    #[error("Scheduler not running")]
    NotRunning,

    #[error("Failed to create scheduler: {source}")]
    CreationFailed { source: JobSchedulerError },

    #[error("Failed to start scheduler: {source}")]
    StartFailed { source: JobSchedulerError },

    #[error("Failed to stop scheduler: {source}")]
    StopFailed { source: JobSchedulerError },

    /// Usually an invalid cron expression.
    #[error("Failed to register job: {source}")]
    JobRegistrationFailed { source: JobSchedulerError },

    #[error("Operation timed out after {duration:?}")]
    Timeout { duration: Duration, source: tokio::time::error::Elapsed },

    #[error("Task join failed: {0}")]
    TaskJoinFailed(#[from] tokio::task::JoinError),
}

impl From<SchedulerError> for InfraError {
    fn from(err: SchedulerError) -> Self {
        let domain_err = match err {
            SchedulerError::AlreadyRunning | SchedulerError::NotRunning => {
                ListSyncError::InvalidInput(err.to_string())
            }
            SchedulerError::JobRegistrationFailed { .. } => ListSyncError::Config(err.to_string()),
            _ => ListSyncError::Internal(err.to_string()),
        };
        InfraError(domain_err)
    }
}

impl From<SchedulerError> for ListSyncError {
    fn from(err: SchedulerError) -> Self {
        InfraError::from(err).into()
    }
}

/// Convenience type alias for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;
