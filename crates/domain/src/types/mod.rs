//! Domain types and models

pub mod batch;
pub mod member;
pub mod outcome;
pub mod subscriber;

pub use batch::{BatchError, BatchErrorCode, BatchOutcome, BatchResult};
pub use member::{ListSummary, MemberInfo, MergeVar};
pub use outcome::Outcome;
pub use subscriber::{
    FieldValue, MergedFields, QueueEntry, QueueStats, QueuedSubscriber, SubscriberInfo,
    SubscriberIntent, UnsubscribeIntent,
};
