// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Cumulative + pending views over every property a session has emitted.

use std::collections::{BTreeMap, BTreeSet};

use crate::batch::PropertyBatch;
use crate::set::PropertySet;
use crate::value::PropValue;

/// Two views over the exported properties, mutated in lockstep.
///
/// - `scene` is cumulative and is never cleared for the life of a session.
/// - `pending` (plus `pending_deleted`) is the delta since the last [`pop`].
///
/// The aggregator also remembers, for each key touched since the last pop, the
/// value the renderer held at that pop. [`pop`] uses it to drop entries that
/// ended up unchanged, so reconverting an unchanged element yields an empty
/// batch.
///
/// [`pop`]: PropertyAggregator::pop
#[derive(Debug, Default)]
pub struct PropertyAggregator {
    scene: PropertySet,
    pending: PropertySet,
    pending_deleted: BTreeSet<String>,
    baseline: BTreeMap<String, Option<Vec<PropValue>>>,
}

impl PropertyAggregator {
    /// Create an empty aggregator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `props` into both views (last write wins per key).
    pub fn set(&mut self, props: &PropertySet) {
        for (key, values) in props.iter() {
            self.touch(key);
            self.scene.insert_values(key.to_owned(), values.to_vec());
            self.pending.insert_values(key.to_owned(), values.to_vec());
            self.pending_deleted.remove(key);
        }
    }

    /// Remove `keys` from both views. Absent keys are ignored.
    pub fn delete_all<I, S>(&mut self, keys: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for key in keys {
            let key = key.as_ref();
            self.touch(key);
            self.pending.remove(key);
            if self.scene.remove(key).is_some() {
                self.pending_deleted.insert(key.to_owned());
            }
        }
    }

    /// Return the pending batch and clear the pending view.
    ///
    /// The cumulative view is untouched.
    pub fn pop(&mut self) -> PropertyBatch {
        let pending = std::mem::take(&mut self.pending);
        let deleted = std::mem::take(&mut self.pending_deleted);
        let baseline = std::mem::take(&mut self.baseline);

        let mut batch = PropertyBatch::default();
        for (key, values) in pending {
            let unchanged = baseline
                .get(&key)
                .is_some_and(|held| held.as_deref() == Some(values.as_slice()));
            if !unchanged {
                batch.set.insert_values(key, values);
            }
        }
        for key in deleted {
            // Never existed on the renderer side: nothing to delete.
            if matches!(baseline.get(&key), Some(None)) {
                continue;
            }
            batch.deleted.insert(key);
        }
        batch
    }

    /// Cumulative view.
    pub fn scene_properties(&self) -> &PropertySet {
        &self.scene
    }

    /// Live pending view (keys set since the last pop, before elision).
    pub fn pending(&self) -> &PropertySet {
        &self.pending
    }

    /// Keys deleted since the last pop, before elision.
    pub fn pending_deletions(&self) -> &BTreeSet<String> {
        &self.pending_deleted
    }

    /// Whether any mutation happened since the last pop.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty() || !self.pending_deleted.is_empty()
    }

    fn touch(&mut self, key: &str) {
        if !self.baseline.contains_key(key) {
            let held = self.scene.get(key).map(<[PropValue]>::to_vec);
            self.baseline.insert(key.to_owned(), held);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(entries: &[(&str, f32)]) -> PropertySet {
        let mut set = PropertySet::new();
        for (key, value) in entries {
            set.set(*key, *value);
        }
        set
    }

    #[test]
    fn set_reaches_both_views() {
        let mut agg = PropertyAggregator::new();
        agg.set(&props(&[("a", 1.0), ("b", 2.0)]));
        assert_eq!(agg.scene_properties().len(), 2);
        assert_eq!(agg.pending().len(), 2);
    }

    #[test]
    fn pop_clears_only_pending() {
        let mut agg = PropertyAggregator::new();
        agg.set(&props(&[("a", 1.0)]));
        let batch = agg.pop();
        assert_eq!(batch.set.len(), 1);
        assert!(!agg.has_pending());
        assert!(agg.scene_properties().contains("a"));
        assert!(agg.pop().is_empty());
    }

    #[test]
    fn delete_then_identical_set_pops_nothing() {
        let mut agg = PropertyAggregator::new();
        agg.set(&props(&[("a", 1.0), ("b", 2.0)]));
        agg.pop();

        agg.delete_all(["a", "b"]);
        agg.set(&props(&[("a", 1.0), ("b", 2.0)]));
        assert!(agg.has_pending());
        assert!(agg.pop().is_empty());
    }

    #[test]
    fn delete_of_popped_key_is_reported() {
        let mut agg = PropertyAggregator::new();
        agg.set(&props(&[("a", 1.0), ("b", 2.0)]));
        agg.pop();

        agg.delete_all(["a", "b"]);
        agg.set(&props(&[("a", 3.0)]));
        let batch = agg.pop();
        assert_eq!(batch.set.first("a"), Some(&PropValue::Float(3.0)));
        assert_eq!(batch.deleted.iter().collect::<Vec<_>>(), vec!["b"]);
        assert!(!agg.scene_properties().contains("b"));
    }

    #[test]
    fn set_and_delete_within_one_batch_cancel_out() {
        let mut agg = PropertyAggregator::new();
        agg.set(&props(&[("a", 1.0)]));
        agg.delete_all(["a"]);
        let batch = agg.pop();
        assert!(batch.is_empty());
        assert!(agg.scene_properties().is_empty());
    }

    #[test]
    fn overlays_reproduce_cumulative_view() {
        let mut agg = PropertyAggregator::new();
        let mut renderer = PropertySet::new();

        agg.set(&props(&[("a", 1.0), ("b", 2.0), ("c", 3.0)]));
        agg.pop().apply_to(&mut renderer);

        agg.delete_all(["a", "b", "c"]);
        agg.set(&props(&[("a", 1.0), ("d", 4.0)]));
        agg.pop().apply_to(&mut renderer);

        assert_eq!(&renderer, agg.scene_properties());
    }
}
