//! Remote-service constants
//!
//! Fault codes and defaults defined by the remote list service. Transport
//! error codes are configurable (see [`crate::TransportErrorCodes`]); the
//! values below only seed the defaults.

/// Maximum number of members sent in one batch call.
///
/// The remote API documents a cap between 5k and 10k per batch update; larger
/// requests risk timing out.
pub const DEFAULT_BATCH_SIZE: usize = 5000;

/// Value returned by a healthy `ping`.
pub const DEFAULT_PING_SENTINEL: &str = "Everything's Chimpy!";

/// Connection timeout for remote calls in milliseconds.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 1000;

/// Overall request timeout for remote calls in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Subscribing an address that previously unsubscribed. Only the member can
/// resubscribe themselves.
pub const FAULT_PREVIOUSLY_UNSUBSCRIBED: i32 = 212;

/// Subscribing an address that has bounced in the past.
pub const FAULT_BOUNCED: i32 = 213;

/// Unsubscribing an address that is not a current member of the list.
pub const FAULT_NOT_SUBSCRIBED: i32 = 215;

/// Unsubscribing an address that was never a member of the list.
pub const FAULT_NOT_FOUND: i32 = 232;

/// Subscribing something that is not a valid email address.
pub const FAULT_INVALID_ADDRESS: i32 = 502;

/// Transport code reported when a request times out.
pub const TRANSPORT_TIMEOUT_CODE: i32 = 28;

/// Transport code reported when the connection cannot be established.
pub const TRANSPORT_CONNECT_CODE: i32 = 7;

/// Transport code reported when host name resolution fails.
pub const TRANSPORT_NAME_LOOKUP_CODE: i32 = 6;

/// Member status that counts as "on the list".
pub const MEMBER_STATUS_SUBSCRIBED: &str = "subscribed";
