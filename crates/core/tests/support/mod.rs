//! Shared test helpers for `listsync-core` integration tests.
//!
//! In-memory fakes for the remote RPC client and the queue store so the
//! service and driver tests can focus on behaviour instead of boilerplate.

#![allow(dead_code)]

pub mod queue;
pub mod rpc;

use listsync_domain::{QueuedSubscriber, SubscriberInfo};

/// Queued subscriber with a first name, enough to produce merge fields.
pub fn subscriber(address: &str) -> QueuedSubscriber {
    QueuedSubscriber::new(address, SubscriberInfo::new().with("first_name", "Test"))
}

/// `count` distinct subscribers `user{n}@example.com`.
pub fn subscribers(count: usize) -> Vec<QueuedSubscriber> {
    (0..count).map(|n| subscriber(&format!("user{n}@example.com"))).collect()
}

pub fn addresses(count: usize) -> Vec<String> {
    (0..count).map(|n| format!("user{n}@example.com")).collect()
}
