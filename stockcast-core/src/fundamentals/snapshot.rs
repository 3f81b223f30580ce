//! Flat key/value fundamentals snapshot.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single scalar from the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SnapshotValue {
    Number(f64),
    Bool(bool),
    Text(String),
}

impl SnapshotValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SnapshotValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SnapshotValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for SnapshotValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotValue::Number(v) => write!(f, "{v}"),
            SnapshotValue::Bool(b) => write!(f, "{b}"),
            SnapshotValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for SnapshotValue {
    fn from(v: f64) -> Self {
        SnapshotValue::Number(v)
    }
}

impl From<bool> for SnapshotValue {
    fn from(b: bool) -> Self {
        SnapshotValue::Bool(b)
    }
}

impl From<&str> for SnapshotValue {
    fn from(s: &str) -> Self {
        SnapshotValue::Text(s.to_string())
    }
}

impl From<String> for SnapshotValue {
    fn from(s: String) -> Self {
        SnapshotValue::Text(s)
    }
}

/// Provider fields keyed by name (`longName`, `trailingPE`, ...).
///
/// Absence is the only "missing" signal. A stored zero is a real zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    fields: BTreeMap<String, SnapshotValue>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<SnapshotValue>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Insert only if `key` is not already present.
    pub fn insert_if_absent(&mut self, key: impl Into<String>, value: impl Into<SnapshotValue>) {
        self.fields.entry(key.into()).or_insert_with(|| value.into());
    }

    pub fn get(&self, key: &str) -> Option<&SnapshotValue> {
        self.fields.get(key)
    }

    /// Numeric field, `None` when absent, non-numeric or non-finite.
    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key)
            .and_then(SnapshotValue::as_f64)
            .filter(|v| v.is_finite())
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(SnapshotValue::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SnapshotValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<SnapshotValue>> FromIterator<(K, V)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut snapshot = Snapshot::new();
        for (k, v) in iter {
            snapshot.insert(k, v);
        }
        snapshot
    }
}
