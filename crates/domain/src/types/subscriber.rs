//! Subscriber records and intents

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single value in a subscriber record.
///
/// Serialized untagged so persisted rows and remote payloads carry plain JSON
/// values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(i64),
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    /// Null, empty strings and empty lists carry no data for the remote side.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(text) => text.is_empty(),
            Self::List(items) => items.is_empty(),
            Self::Bool(_) | Self::Number(_) => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Generic subscriber record keyed by local field names (`first_name`,
/// `interests`, ...).
///
/// Callers routinely pass a superset of what the remote list knows about;
/// unknown keys are dropped when the record is merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriberInfo(BTreeMap<String, FieldValue>);

impl SubscriberInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, FieldValue)> for SubscriberInfo {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Subscriber record translated into the remote service's merge-field names.
pub type MergedFields = BTreeMap<String, FieldValue>;

/// Request to add an address to the list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriberIntent {
    pub address: String,
    #[serde(default)]
    pub info: SubscriberInfo,
    pub send_welcome: bool,
}

impl SubscriberIntent {
    pub fn new(address: impl Into<String>, info: SubscriberInfo, send_welcome: bool) -> Self {
        Self { address: address.into(), info, send_welcome }
    }
}

/// Request to remove an address from the list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsubscribeIntent {
    pub address: String,
}

/// Handle on one queued row as seen by a snapshot.
///
/// Re-enqueueing the same key bumps `revision`, so deleting by handle never
/// removes an intent recorded after the snapshot was taken.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueueEntry {
    pub address: String,
    #[serde(default)]
    pub revision: u64,
}

impl QueueEntry {
    pub fn new(address: impl Into<String>, revision: u64) -> Self {
        Self { address: address.into(), revision }
    }
}

/// Subscriber as stored in, and read back from, the local queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedSubscriber {
    pub address: String,
    #[serde(default)]
    pub info: SubscriberInfo,
    #[serde(default)]
    pub revision: u64,
}

impl QueuedSubscriber {
    pub fn new(address: impl Into<String>, info: SubscriberInfo) -> Self {
        Self { address: address.into(), info, revision: 0 }
    }

    #[must_use]
    pub fn with_revision(mut self, revision: u64) -> Self {
        self.revision = revision;
        self
    }

    pub fn entry(&self) -> QueueEntry {
        QueueEntry::new(self.address.clone(), self.revision)
    }
}

/// Pending work held by the queue store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    pub welcome_subscribes: u64,
    pub plain_subscribes: u64,
    pub unsubscribes: u64,
}

impl QueueStats {
    pub const fn total(&self) -> u64 {
        self.welcome_subscribes + self.plain_subscribes + self.unsubscribes
    }
}
