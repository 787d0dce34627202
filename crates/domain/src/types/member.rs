//! Read-only records returned by the remote list service

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::MEMBER_STATUS_SUBSCRIBED;

/// Member record as reported by the remote service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemberInfo {
    #[serde(default)]
    pub email: String,
    /// `subscribed`, `unsubscribed`, `cleaned` or `pending`.
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub email_type: Option<String>,
    #[serde(default)]
    pub merges: BTreeMap<String, serde_json::Value>,
}

impl MemberInfo {
    pub fn is_subscribed(&self) -> bool {
        self.status == MEMBER_STATUS_SUBSCRIBED
    }
}

/// Merge field defined on the remote list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeVar {
    pub name: String,
    pub tag: String,
    #[serde(default)]
    pub req: bool,
    #[serde(default)]
    pub field_type: Option<String>,
}

/// Summary of one list on the remote account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListSummary {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub member_count: u64,
}
