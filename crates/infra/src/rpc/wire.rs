//! Response shapes of the remote API that differ from the domain types

use listsync_domain::{BatchError, BatchErrorCode, BatchResult, ListSummary, MemberInfo};
use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub(crate) struct WireBatchError {
    pub code: i32,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Batch subscribe echoes the rejected record instead of the address.
    #[serde(default)]
    pub row: Option<Map<String, Value>>,
}

impl From<WireBatchError> for BatchError {
    fn from(wire: WireBatchError) -> Self {
        let address = wire.email.or_else(|| {
            wire.row
                .as_ref()
                .and_then(|row| row.get("EMAIL"))
                .and_then(Value::as_str)
                .map(str::to_string)
        });
        Self { code: BatchErrorCode::Fault(wire.code), message: wire.message, address }
    }
}

/// `listBatchSubscribe` reply.
#[derive(Debug, Deserialize)]
pub(crate) struct BatchSubscribeReply {
    #[serde(default)]
    pub add_count: u64,
    #[serde(default)]
    pub update_count: u64,
    #[serde(default)]
    pub error_count: u64,
    #[serde(default)]
    pub errors: Vec<WireBatchError>,
}

impl From<BatchSubscribeReply> for BatchResult {
    fn from(reply: BatchSubscribeReply) -> Self {
        Self {
            success_count: reply.add_count.saturating_add(reply.update_count),
            error_count: reply.error_count,
            errors: reply.errors.into_iter().map(BatchError::from).collect(),
        }
    }
}

/// `listBatchUnsubscribe` reply.
#[derive(Debug, Deserialize)]
pub(crate) struct BatchUnsubscribeReply {
    #[serde(default)]
    pub success_count: u64,
    #[serde(default)]
    pub error_count: u64,
    #[serde(default)]
    pub errors: Vec<WireBatchError>,
}

impl From<BatchUnsubscribeReply> for BatchResult {
    fn from(reply: BatchUnsubscribeReply) -> Self {
        Self {
            success_count: reply.success_count,
            error_count: reply.error_count,
            errors: reply.errors.into_iter().map(BatchError::from).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct MemberLookupError {
    #[serde(default)]
    pub code: Option<i32>,
    #[serde(alias = "message")]
    pub error: String,
}

/// One `data` entry of a `listMemberInfo` reply.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum MemberEntry {
    Missing(MemberLookupError),
    Found(MemberInfo),
}

/// `listMemberInfo` reply; one `data` entry per requested address. The
/// top-level `success`/`errors` counters are ignored.
#[derive(Debug, Deserialize)]
pub(crate) struct MemberInfoReply {
    #[serde(default)]
    pub data: Vec<MemberEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct WireListStats {
    #[serde(default)]
    pub member_count: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireList {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub stats: WireListStats,
}

impl From<WireList> for ListSummary {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn from(list: WireList) -> Self {
        Self { id: list.id, name: list.name, member_count: list.stats.member_count.max(0.0) as u64 }
    }
}

/// `lists` reply.
#[derive(Debug, Deserialize)]
pub(crate) struct ListsReply {
    #[serde(default)]
    pub data: Vec<WireList>,
}
