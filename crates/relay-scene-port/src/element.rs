// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Element identity and kind tags.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Opaque host identity of a datablock (pointer value, session uid, ...).
///
/// Only meaningful while the host session that produced it is alive.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementId(pub u64);

/// Identity shared by every addressable scene element.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Datablock {
    /// Host identity.
    pub id: ElementId,
    /// User-visible name, unique within its library.
    pub name: String,
    /// Linked library path, `None` for local data.
    pub library: Option<String>,
}

impl Datablock {
    /// Local datablock.
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id: ElementId(id),
            name: name.into(),
            library: None,
        }
    }

    /// Datablock linked from `library`.
    pub fn linked(id: u64, name: impl Into<String>, library: impl Into<String>) -> Self {
        Self {
            id: ElementId(id),
            name: name.into(),
            library: Some(library.into()),
        }
    }

    /// Library-qualified name (`lib/name`, or `name` for local data).
    pub fn qualified_name(&self) -> String {
        match &self.library {
            Some(lib) => format!("{lib}/{}", self.name),
            None => self.name.clone(),
        }
    }
}

/// Every kind of element the exporter converts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ElementKind {
    /// The active camera (single record).
    Camera,
    /// World settings (single record).
    World,
    /// Top-level scene object.
    Object,
    /// Mesh geometry data.
    Mesh,
    /// Surface material.
    Material,
    /// Texture node.
    Texture,
    /// Light source.
    Light,
    /// Participating medium (volume).
    Medium,
    /// Particle / duplication system.
    Duplication,
}

impl ElementKind {
    /// Domain-separation prefix used when hashing keys of this kind.
    pub const fn domain(self) -> &'static [u8] {
        match self {
            Self::Camera => b"camera:",
            Self::World => b"world:",
            Self::Object => b"object:",
            Self::Mesh => b"mesh:",
            Self::Material => b"material:",
            Self::Texture => b"texture:",
            Self::Light => b"light:",
            Self::Medium => b"medium:",
            Self::Duplication => b"dupli:",
        }
    }

    /// Short prefix for identity-derived renderer names.
    pub const fn name_prefix(self) -> &'static str {
        match self {
            Self::Camera => "cam",
            Self::World => "wld",
            Self::Object => "obj",
            Self::Mesh => "msh",
            Self::Material => "mat",
            Self::Texture => "tex",
            Self::Light => "lgt",
            Self::Medium => "vol",
            Self::Duplication => "dup",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Camera => "camera",
            Self::World => "world",
            Self::Object => "object",
            Self::Mesh => "mesh",
            Self::Material => "material",
            Self::Texture => "texture",
            Self::Light => "light",
            Self::Medium => "medium",
            Self::Duplication => "duplication",
        })
    }
}

/// Shared resources that may be referenced by many elements in one pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Materials (object slots, mix operands).
    Material,
    /// Textures (material channels, texture inputs).
    Texture,
    /// Media (camera exterior, material volumes, world default).
    Medium,
}

impl From<ResourceKind> for ElementKind {
    fn from(kind: ResourceKind) -> Self {
        match kind {
            ResourceKind::Material => Self::Material,
            ResourceKind::Texture => Self::Texture,
            ResourceKind::Medium => Self::Medium,
        }
    }
}

/// Which flavour of geometry/material the host is asking for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// Interactive viewport preview.
    Preview,
    /// Final render.
    #[default]
    Final,
}
