// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Session-wide reservation of renderer-side names.
//!
//! Every name a record writes under `scene.<section>.` is reserved here
//! first. A name belongs to exactly one `(owner key, requested name)` pair
//! for the whole session; a second owner asking for the same name gets it
//! suffixed with its key's short hex. Two records therefore never own the
//! same property key, whatever the host names look like.

use relay_scene_port::{ElementKey, ElementKind};
use rustc_hash::{FxHashMap, FxHashSet};

/// Renderer namespace a name lives in (`scene.<section>.<name>`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum Section {
    Objects,
    Shapes,
    Materials,
    Textures,
    Lights,
    Volumes,
    Camera,
}

impl Section {
    /// Section written by records of `kind`.
    pub(crate) const fn of(kind: ElementKind) -> Self {
        match kind {
            ElementKind::Object | ElementKind::Duplication => Self::Objects,
            ElementKind::Mesh => Self::Shapes,
            ElementKind::Material => Self::Materials,
            ElementKind::Texture => Self::Textures,
            ElementKind::Light => Self::Lights,
            ElementKind::Medium => Self::Volumes,
            ElementKind::Camera | ElementKind::World => Self::Camera,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct NameTable {
    /// Every name handed out so far.
    taken: FxHashSet<(Section, String)>,
    /// Owner to the name it was given.
    assigned: FxHashMap<(Section, ElementKey, String), String>,
}

impl NameTable {
    /// Name for `requested` on behalf of `owner`. Stable for the session.
    pub(crate) fn reserve(
        &mut self,
        section: Section,
        owner: ElementKey,
        requested: &str,
    ) -> String {
        let claim = (section, owner, requested.to_owned());
        if let Some(name) = self.assigned.get(&claim) {
            return name.clone();
        }
        let mut candidate = requested.to_owned();
        let mut attempt = 0_u32;
        while self.taken.contains(&(section, candidate.clone())) {
            candidate = if attempt == 0 {
                format!("{requested}_{}", owner.short_hex())
            } else {
                format!("{requested}_{}_{attempt}", owner.short_hex())
            };
            attempt += 1;
        }
        self.taken.insert((section, candidate.clone()));
        self.assigned.insert(claim, candidate.clone());
        candidate
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.taken.len()
    }
}
