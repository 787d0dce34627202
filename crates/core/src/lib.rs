//! # listsync Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port interfaces for the remote list service and the local queue store
//! - Request classification, merge-field mapping and batch chunking
//! - The list service (single and batch operations with queue fallback)
//! - The reconciliation driver that drains the queue
//!
//! ## Architecture Principles
//! - Only depends on `listsync-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod list;
pub mod queue;
pub mod reconcile;

// Re-export specific items to avoid ambiguity
pub use list::classifier::{Disposition, RequestClassifier, RequestKind};
pub use list::errors::{ListError, RemoteError, RemoteResult};
pub use list::merge::{merge_info, FieldMap, FieldOverrides, INTERESTS_FIELD};
pub use list::ports::{
    ListRpcClient, MailingList, RemovalFlags, SubscribeFlags, SubscribeRequest,
};
pub use list::service::{ListService, ListServiceConfig};
pub use queue::ports::SubscriptionQueue;
pub use reconcile::{
    DrainStage, ReconcileOptions, ReconcileReport, Reconciler, StageAction, StageReport,
};
