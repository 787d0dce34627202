//! Remote call and list operation errors

use listsync_domain::ListSyncError;
use thiserror::Error;

/// Error returned by a remote RPC call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The remote service rejected the call with a provider-defined code.
    #[error("remote fault {code}: {message}")]
    Fault { code: i32, message: String },

    /// The call never produced a response; `code` is transport specific.
    #[error("transport error {code}: {message}")]
    Transport { code: i32, message: String },

    /// A response arrived but did not have the expected shape.
    #[error("unexpected remote response: {0}")]
    Protocol(String),
}

impl RemoteError {
    pub fn fault(code: i32, message: impl Into<String>) -> Self {
        Self::Fault { code, message: message.into() }
    }

    pub fn transport(code: i32, message: impl Into<String>) -> Self {
        Self::Transport { code, message: message.into() }
    }

    pub const fn fault_code(&self) -> Option<i32> {
        match self {
            Self::Fault { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub const fn transport_code(&self) -> Option<i32> {
        match self {
            Self::Transport { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Result alias for remote calls.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Failure of a list operation that the caller has to handle.
///
/// Expected rejections (invalid address, not subscribed, ...) are reported as
/// an [`listsync_domain::Outcome`] instead; only conditions that are neither
/// classified nor queueable end up here.
#[derive(Debug, Error)]
pub enum ListError {
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("remote list service unavailable and no queue is configured")]
    Unavailable,

    #[error("queue store failure: {0}")]
    Queue(#[from] ListSyncError),
}

impl From<ListError> for ListSyncError {
    fn from(err: ListError) -> Self {
        match err {
            ListError::Remote(RemoteError::Transport { code, message }) => {
                Self::Network(format!("transport error {code}: {message}"))
            }
            ListError::Remote(remote) => Self::Remote(remote.to_string()),
            ListError::Unavailable => Self::Network(ListError::Unavailable.to_string()),
            ListError::Queue(inner) => inner,
        }
    }
}
