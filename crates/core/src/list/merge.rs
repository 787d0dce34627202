//! Subscriber info to remote merge-field translation

use std::collections::BTreeMap;

use listsync_domain::{FieldValue, MergedFields, SubscriberInfo};

/// Remote field receiving the comma-joined interest groups.
pub const INTERESTS_FIELD: &str = "INTERESTS";

/// Per-call overrides of the field map (`local name -> remote name`).
pub type FieldOverrides = BTreeMap<String, String>;

const DEFAULT_FIELDS: [(&str, &str); 5] = [
    ("email", "EMAIL"),
    ("first_name", "FNAME"),
    ("last_name", "LNAME"),
    ("user_ip", "OPTINIP"),
    ("interests", INTERESTS_FIELD),
];

/// Mapping from local field names to remote merge fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMap(BTreeMap<String, String>);

impl Default for FieldMap {
    fn default() -> Self {
        Self(
            DEFAULT_FIELDS
                .iter()
                .map(|(local, remote)| ((*local).to_string(), (*remote).to_string()))
                .collect(),
        )
    }
}

impl FieldMap {
    /// Default map with `overrides` applied on top.
    pub fn with_overrides(overrides: &FieldOverrides) -> Self {
        let mut map = Self::default();
        map.extend(overrides);
        map
    }

    pub fn extend(&mut self, overrides: &FieldOverrides) {
        for (local, remote) in overrides {
            self.0.insert(local.clone(), remote.clone());
        }
    }

    pub fn remote_name(&self, local: &str) -> Option<&str> {
        self.0.get(local).map(String::as_str)
    }

    /// Translate `info` into remote merge fields.
    ///
    /// Keys missing from the map and empty values are dropped. A list bound
    /// for [`INTERESTS_FIELD`] is joined with commas.
    pub fn merge(&self, info: &SubscriberInfo, overrides: &FieldOverrides) -> MergedFields {
        info.iter()
            .filter(|(_, value)| !value.is_empty())
            .filter_map(|(key, value)| {
                let remote =
                    overrides.get(key).map(String::as_str).or_else(|| self.remote_name(key))?;
                let value = match value {
                    FieldValue::List(items) if remote == INTERESTS_FIELD => {
                        FieldValue::Text(items.join(","))
                    }
                    other => other.clone(),
                };
                Some((remote.to_string(), value))
            })
            .collect()
    }
}

/// [`FieldMap::merge`] against the default map.
pub fn merge_info(info: &SubscriberInfo, overrides: &FieldOverrides) -> MergedFields {
    FieldMap::default().merge(info, overrides)
}
