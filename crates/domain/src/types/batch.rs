//! Batch accounting types

use serde::{Deserialize, Serialize};

use super::Outcome;

/// Code attached to a failed batch entry.
///
/// Entries synthesized locally carry an [`Outcome`]; entries reported by the
/// remote batch call carry the raw fault code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BatchErrorCode {
    Outcome(Outcome),
    Fault(i32),
}

impl std::fmt::Display for BatchErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Outcome(outcome) => write!(f, "{outcome}"),
            Self::Fault(code) => write!(f, "{code}"),
        }
    }
}

/// One failed address inside a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchError {
    pub code: BatchErrorCode,
    #[serde(default)]
    pub message: String,
    #[serde(default, alias = "email")]
    pub address: Option<String>,
}

impl BatchError {
    /// Error entry for an address whose single-request outcome was not a
    /// success.
    pub fn from_outcome(address: &str, outcome: Outcome) -> Self {
        Self {
            code: BatchErrorCode::Outcome(outcome),
            message: format!("Error subscribing {address}"),
            address: Some(address.to_string()),
        }
    }

    pub fn is_requeued(&self) -> bool {
        matches!(self.code, BatchErrorCode::Outcome(Outcome::Queued))
    }
}

/// Aggregate result of a batch call.
///
/// Acts as the accumulator while chunks are processed; aggregation is
/// associative so chunk results can be absorbed in any grouping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    #[serde(default)]
    pub success_count: u64,
    #[serde(default)]
    pub error_count: u64,
    #[serde(default)]
    pub errors: Vec<BatchError>,
}

impl BatchResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&mut self) {
        self.success_count = self.success_count.saturating_add(1);
    }

    pub fn record_error(&mut self, error: BatchError) {
        self.error_count = self.error_count.saturating_add(1);
        self.errors.push(error);
    }

    /// Add another (chunk) result into this one.
    pub fn absorb(&mut self, other: BatchResult) {
        self.success_count = self.success_count.saturating_add(other.success_count);
        self.error_count = self.error_count.saturating_add(other.error_count);
        self.errors.extend(other.errors);
    }

    #[must_use]
    pub fn merge(mut self, other: BatchResult) -> Self {
        self.absorb(other);
        self
    }

    /// Addresses that ended up back in the local queue during this batch.
    pub fn requeued_addresses(&self) -> impl Iterator<Item = &str> {
        self.errors
            .iter()
            .filter(|error| error.is_requeued())
            .filter_map(|error| error.address.as_deref())
    }

    pub fn is_clean(&self) -> bool {
        self.error_count == 0
    }
}

/// What a batch operation did with its input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    /// The remote service processed the batch.
    Completed(BatchResult),
    /// The remote service was unavailable and the whole batch was queued.
    Queued,
}

impl BatchOutcome {
    pub fn result(&self) -> Option<&BatchResult> {
        match self {
            Self::Completed(result) => Some(result),
            Self::Queued => None,
        }
    }
}
