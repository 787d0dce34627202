//! Classification of remote call results
//!
//! Every single-request attempt ends in exactly one [`Disposition`]: an
//! outcome to report, a request to queue for the next pass, or a fatal error
//! for the caller.

use listsync_domain::constants::{
    FAULT_BOUNCED, FAULT_INVALID_ADDRESS, FAULT_NOT_FOUND, FAULT_NOT_SUBSCRIBED,
    FAULT_PREVIOUSLY_UNSUBSCRIBED,
};
use listsync_domain::{Outcome, TransportErrorCodes};

use super::errors::RemoteError;

/// Which remote operation produced the result being classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Subscribe,
    Unsubscribe,
}

/// What to do with a classified result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Report this outcome to the caller.
    Report(Outcome),
    /// Transient failure; queue the intent for the next pass.
    Queue,
    /// Unclassified failure; propagate to the caller.
    Fatal,
}

/// Maps remote faults and transport errors onto dispositions.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestClassifier {
    transport_codes: TransportErrorCodes,
}

impl RequestClassifier {
    pub const fn new(transport_codes: TransportErrorCodes) -> Self {
        Self { transport_codes }
    }

    pub const fn transport_codes(&self) -> &TransportErrorCodes {
        &self.transport_codes
    }

    /// A remote `true`/`false` answer.
    pub const fn classify_value(accepted: bool) -> Disposition {
        Disposition::Report(Outcome::from_remote(accepted))
    }

    pub fn classify_error(&self, kind: RequestKind, error: &RemoteError) -> Disposition {
        match error {
            RemoteError::Fault { code, .. } => Self::classify_fault(kind, *code),
            RemoteError::Transport { code, .. } if self.transport_codes.is_transient(*code) => {
                Disposition::Queue
            }
            RemoteError::Transport { .. } | RemoteError::Protocol(_) => Disposition::Fatal,
        }
    }

    /// Whether `error` is a transport failure the probe should treat as a
    /// plain "unavailable".
    pub fn is_transient(&self, error: &RemoteError) -> bool {
        error.transport_code().is_some_and(|code| self.transport_codes.is_transient(code))
    }

    fn classify_fault(kind: RequestKind, code: i32) -> Disposition {
        match (kind, code) {
            (RequestKind::Subscribe, FAULT_PREVIOUSLY_UNSUBSCRIBED | FAULT_BOUNCED) => {
                Disposition::Report(Outcome::Failure)
            }
            (RequestKind::Subscribe, FAULT_INVALID_ADDRESS) => {
                Disposition::Report(Outcome::InvalidAddress)
            }
            (RequestKind::Unsubscribe, FAULT_NOT_SUBSCRIBED) => {
                Disposition::Report(Outcome::NotSubscribed)
            }
            (RequestKind::Unsubscribe, FAULT_NOT_FOUND) => Disposition::Report(Outcome::NotFound),
            _ => Disposition::Fatal,
        }
    }
}
