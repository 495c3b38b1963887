// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Flat, dotted-key property set.

use core::fmt;
use std::collections::btree_map::{self, BTreeMap};

use serde::{Deserialize, Serialize};

use crate::value::{IntoPropValues, PropValue};

/// Ordered mapping from dotted keys to one-or-more scalar values.
///
/// Keys iterate in lexicographic order so two sets holding the same entries
/// always render to the same text.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertySet {
    entries: BTreeMap<String, Vec<PropValue>>,
}

impl PropertySet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `values`, replacing any previous definition.
    pub fn set<K, V>(&mut self, key: K, values: V) -> &mut Self
    where
        K: Into<String>,
        V: IntoPropValues,
    {
        self.entries.insert(key.into(), values.into_prop_values());
        self
    }

    /// Set `key` to an already-built value list.
    pub fn insert_values(&mut self, key: String, values: Vec<PropValue>) -> Option<Vec<PropValue>> {
        self.entries.insert(key, values)
    }

    /// Values stored under `key`.
    pub fn get(&self, key: &str) -> Option<&[PropValue]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// First value stored under `key`.
    pub fn first(&self, key: &str) -> Option<&PropValue> {
        self.entries.get(key).and_then(|v| v.first())
    }

    /// First value under `key` if it is a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.first(key).and_then(PropValue::as_str)
    }

    /// Whether `key` is defined.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Remove a single key, returning its values.
    pub fn remove(&mut self, key: &str) -> Option<Vec<PropValue>> {
        self.entries.remove(key)
    }

    /// Remove every listed key that is present. Absent keys are ignored.
    pub fn delete_all<I, S>(&mut self, keys: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for key in keys {
            self.entries.remove(key.as_ref());
        }
    }

    /// Merge `other` into `self`; keys from `other` win.
    pub fn merge(&mut self, other: &Self) {
        for (key, values) in &other.entries {
            self.entries.insert(key.clone(), values.clone());
        }
    }

    /// Iterate over keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }

    /// Iterate over `(key, values)` in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[PropValue])> + '_ {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set holds no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Copy of every entry whose key starts with `prefix`.
    pub fn with_prefix(&self, prefix: &str) -> Self {
        self.entries
            .range(prefix.to_owned()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl fmt::Display for PropertySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, values) in &self.entries {
            f.write_str(key)?;
            f.write_str(" =")?;
            for value in values {
                write!(f, " {value}")?;
            }
            f.write_str("\n")?;
        }
        Ok(())
    }
}

impl FromIterator<(String, Vec<PropValue>)> for PropertySet {
    fn from_iter<T: IntoIterator<Item = (String, Vec<PropValue>)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for PropertySet {
    type Item = (String, Vec<PropValue>);
    type IntoIter = btree_map::IntoIter<String, Vec<PropValue>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
