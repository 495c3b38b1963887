// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-pass dedup guards for shared resources.

use relay_scene_port::{ElementKey, ResourceKind};
use rustc_hash::FxHashSet;

/// Outcome of claiming a resource for conversion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Claim {
    /// First request this pass: convert it.
    New,
    /// Already converted (or being converted) this pass: reuse its name.
    Duplicate,
}

/// Set of keys already claimed during the current pass.
///
/// Cleared only when the pass's pending batch is popped; never between two
/// elements of the same pass.
#[derive(Debug, Default)]
pub struct DedupGuard {
    claimed: FxHashSet<ElementKey>,
}

impl DedupGuard {
    /// Claim `key`.
    pub fn request(&mut self, key: ElementKey) -> Claim {
        if self.claimed.insert(key) {
            Claim::New
        } else {
            Claim::Duplicate
        }
    }

    /// Whether `key` was claimed this pass.
    pub fn contains(&self, key: &ElementKey) -> bool {
        self.claimed.contains(key)
    }

    /// Number of claimed keys.
    pub fn len(&self) -> usize {
        self.claimed.len()
    }

    /// Whether nothing was claimed.
    pub fn is_empty(&self) -> bool {
        self.claimed.is_empty()
    }

    /// Forget every claim (end of pass).
    pub fn clear(&mut self) {
        self.claimed.clear();
    }
}

/// One guard per shared resource kind.
#[derive(Debug, Default)]
pub struct DedupGuards {
    materials: DedupGuard,
    textures: DedupGuard,
    media: DedupGuard,
}

impl DedupGuards {
    /// Claim `key` in the guard for `kind`.
    pub fn request(&mut self, kind: ResourceKind, key: ElementKey) -> Claim {
        self.guard_mut(kind).request(key)
    }

    /// Guard for `kind`.
    pub fn guard(&self, kind: ResourceKind) -> &DedupGuard {
        match kind {
            ResourceKind::Material => &self.materials,
            ResourceKind::Texture => &self.textures,
            ResourceKind::Medium => &self.media,
        }
    }

    fn guard_mut(&mut self, kind: ResourceKind) -> &mut DedupGuard {
        match kind {
            ResourceKind::Material => &mut self.materials,
            ResourceKind::Texture => &mut self.textures,
            ResourceKind::Medium => &mut self.media,
        }
    }

    /// Clear every guard.
    pub fn clear(&mut self) {
        self.materials.clear();
        self.textures.clear();
        self.media.clear();
    }
}
