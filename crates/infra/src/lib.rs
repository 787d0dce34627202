//! # listsync Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - The SQLite subscription queue (rusqlite + r2d2)
//! - The JSON-over-HTTP remote list client (reqwest)
//! - Configuration loading, the instance lock and the cron scheduler
//!
//! ## Architecture
//! - Implements traits defined in `listsync-core`
//! - Contains all "impure" code (I/O, network, filesystem)

pub mod config;
pub mod database;
pub mod errors;
pub mod http;
pub mod instance_lock;
pub mod rpc;
pub mod scheduling;

// Re-export commonly used items
pub use database::{DbManager, SqliteSubscriptionQueue};
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
pub use instance_lock::InstanceLock;
pub use rpc::JsonRpcListClient;
pub use scheduling::{ReconcileJob, ReconcileScheduler, ReconcileSchedulerConfig};
