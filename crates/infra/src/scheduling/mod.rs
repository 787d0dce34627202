//! Cron-based scheduling of reconciliation passes
//!
//! The scheduler owns an explicit start/stop lifecycle with a cancellation
//! token; each tick runs at most one pass at a time.

pub mod error;
pub mod reconcile_scheduler;

pub use error::{SchedulerError, SchedulerResult};
pub use reconcile_scheduler::{ReconcileJob, ReconcileScheduler, ReconcileSchedulerConfig};
