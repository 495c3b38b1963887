// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-kind element caches with diff-then-replace semantics.
//!
//! A record owns exactly the property keys its last conversion produced.
//! Replacing a record is always two-phase:
//!
//! 1. [`ElementCache::purge`] removes every key the old record owned from both
//!    aggregator views;
//! 2. the element is reconverted (which may recursively convert others);
//! 3. [`ElementCache::commit`] merges the new keys and stores the record.
//!
//! Because step 2 needs mutable access to *other* caches, the phases are
//! separate calls driven by [`ConvertContext`](crate::ConvertContext) rather
//! than one call taking a closure.

use relay_props::{PropertyAggregator, PropertySet};
use relay_scene_port::ElementKey;
use rustc_hash::FxHashMap;

use crate::translate::Converter;

/// Cached result of converting one element.
#[derive(Debug, Clone)]
pub struct ExporterRecord {
    /// Cache key.
    pub key: ElementKey,
    /// Live converter that produced `properties`.
    pub converter: Converter,
    /// Exactly the properties this record contributed.
    pub properties: PropertySet,
    /// Host revision converted at, for kinds that track one.
    pub revision: Option<u64>,
}

impl ExporterRecord {
    /// Renderer-side name.
    pub fn generated_name(&self) -> &str {
        self.converter.generated_name()
    }

    /// Keys owned by this record.
    pub fn owned_keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.properties.keys()
    }
}

/// Keyed store of [`ExporterRecord`]s for one element kind.
///
/// Entries are never evicted within a session.
#[derive(Debug, Default)]
pub struct ElementCache {
    records: FxHashMap<ElementKey, ExporterRecord>,
}

impl ElementCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove the keys owned by `key`'s record from both aggregator views.
    ///
    /// Returns `false` when the key was never converted (nothing to purge).
    pub fn purge(&self, key: &ElementKey, aggregator: &mut PropertyAggregator) -> bool {
        match self.records.get(key) {
            Some(record) => {
                aggregator.delete_all(record.owned_keys());
                true
            }
            None => false,
        }
    }

    /// Merge the record's properties into the aggregator and store it,
    /// replacing any previous record for the same key.
    pub fn commit(&mut self, record: ExporterRecord, aggregator: &mut PropertyAggregator) {
        aggregator.set(&record.properties);
        self.records.insert(record.key, record);
    }

    /// Record for `key`.
    pub fn get(&self, key: &ElementKey) -> Option<&ExporterRecord> {
        self.records.get(key)
    }

    /// Whether `key` has been converted this session.
    pub fn contains(&self, key: &ElementKey) -> bool {
        self.records.contains_key(key)
    }

    /// Renderer-side name of `key`'s record.
    pub fn generated_name(&self, key: &ElementKey) -> Option<&str> {
        self.records.get(key).map(ExporterRecord::generated_name)
    }

    /// Whether `key` was last converted at `revision`.
    pub fn is_current(&self, key: &ElementKey, revision: u64) -> bool {
        self.records
            .get(key)
            .is_some_and(|r| r.revision == Some(revision))
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over records (unordered).
    pub fn iter(&self) -> impl Iterator<Item = &ExporterRecord> + '_ {
        self.records.values()
    }

    /// Union of every record's properties.
    pub fn owned_union(&self) -> PropertySet {
        let mut union = PropertySet::new();
        for record in self.records.values() {
            union.merge(&record.properties);
        }
        union
    }
}

/// Single-record slot for elements that only ever exist once per session
/// (the camera, the world's default medium).
#[derive(Debug, Default)]
pub struct SlotRecord {
    properties: PropertySet,
}

impl SlotRecord {
    /// Remove the slot's owned keys from both aggregator views.
    pub fn purge(&self, aggregator: &mut PropertyAggregator) {
        aggregator.delete_all(self.properties.keys());
    }

    /// Merge and store the slot's new properties.
    pub fn commit(&mut self, properties: PropertySet, aggregator: &mut PropertyAggregator) {
        aggregator.set(&properties);
        self.properties = properties;
    }

    /// Properties the slot currently owns.
    pub fn properties(&self) -> &PropertySet {
        &self.properties
    }
}
