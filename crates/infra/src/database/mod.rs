//! Local queue database

pub mod manager;
pub mod queue_repository;

pub use manager::{DbConnection, DbManager};
pub use queue_repository::SqliteSubscriptionQueue;
