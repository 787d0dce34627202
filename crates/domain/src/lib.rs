//! # listsync Domain
//!
//! Business domain types and models for the list synchronization engine.
//!
//! This crate contains:
//! - Subscriber intents, merge-field values and member records
//! - Request outcomes and batch accounting types
//! - Domain error types and Result definitions
//! - Configuration structures and remote-service constants
//!
//! ## Architecture
//! - No dependencies on other listsync crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
