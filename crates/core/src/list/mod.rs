//! Remote list operations
//!
//! Single and batch subscribe/unsubscribe against the remote list service,
//! with classification of remote faults and fallback to the local queue.

pub mod batch;
pub mod classifier;
pub mod errors;
pub mod merge;
pub mod ports;
pub mod service;

pub use classifier::{Disposition, RequestClassifier, RequestKind};
pub use errors::{ListError, RemoteError, RemoteResult};
pub use merge::{merge_info, FieldMap, FieldOverrides};
pub use ports::{ListRpcClient, MailingList};
pub use service::{ListService, ListServiceConfig};
