// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Incremental patch popped from the aggregator.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::set::PropertySet;

/// One pending batch: keys to (re)define and keys to drop.
///
/// Batches are overlays. Apply them in the order they were popped; a key is
/// never both in `set` and in `deleted`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyBatch {
    /// Keys defined or redefined since the previous pop.
    pub set: PropertySet,
    /// Keys whose previous definition must be removed.
    pub deleted: BTreeSet<String>,
}

impl PropertyBatch {
    /// Whether applying this batch would change nothing.
    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.deleted.is_empty()
    }

    /// Total number of touched keys.
    pub fn len(&self) -> usize {
        self.set.len() + self.deleted.len()
    }

    /// Overlay this batch onto `target`.
    pub fn apply_to(&self, target: &mut PropertySet) {
        target.delete_all(&self.deleted);
        target.merge(&self.set);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_removes_then_sets() {
        let mut target = PropertySet::new();
        target.set("a", 1).set("b", 2);

        let mut batch = PropertyBatch::default();
        batch.set.set("c", 3);
        batch.deleted.insert("b".to_owned());
        batch.apply_to(&mut target);

        assert_eq!(target.keys().collect::<Vec<_>>(), vec!["a", "c"]);
        assert_eq!(batch.len(), 2);
    }
}
