//! Terminal classification of a single request attempt.

use serde::{Deserialize, Serialize};

use crate::impl_domain_code_conversions;

/// Result of one subscribe/unsubscribe/update attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Failure,
    /// The intent was written to the local queue for a later pass.
    Queued,
    NotFound,
    NotSubscribed,
    InvalidAddress,
}

impl_domain_code_conversions!(Outcome {
    Success => "success",
    Failure => "failure",
    Queued => "queued",
    NotFound => "not_found",
    NotSubscribed => "not_subscribed",
    InvalidAddress => "invalid_address",
});

impl Outcome {
    /// Convert the boolean returned by the remote service.
    pub const fn from_remote(applied: bool) -> Self {
        if applied {
            Self::Success
        } else {
            Self::Failure
        }
    }

    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }

    /// Message shown to a person who just asked to be subscribed.
    pub const fn user_message(self) -> &'static str {
        match self {
            Self::Success => "Thank you. Your email address has been subscribed.",
            Self::Queued => {
                "Thank you. Your subscription request has been received and will be \
                 processed shortly."
            }
            Self::InvalidAddress => {
                "Sorry, the email address you entered is not a valid email address."
            }
            Self::NotFound | Self::NotSubscribed => {
                "This email address is not subscribed to the list."
            }
            Self::Failure => "Sorry, there was an issue processing your request.",
        }
    }
}
