//! Queue reconciliation
//!
//! One pass checks availability once and then drains, in order, queued
//! subscribes with a welcome email, queued plain subscribes and queued
//! unsubscribes.

pub mod driver;
pub mod report;

pub use driver::{ReconcileOptions, Reconciler};
pub use report::{DrainStage, ReconcileReport, StageAction, StageReport};
