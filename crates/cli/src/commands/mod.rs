//! Command handlers

pub mod reconcile;
pub mod status;
pub mod subscription;
