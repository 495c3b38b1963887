// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Element key and renderer-name derivation.
//!
//! A cache key must be stable across cycles for "the same" element, and must
//! differ whenever the exported result would differ (a mesh exported for the
//! viewport is not the mesh exported for the final render). Two strategies
//! exist because hosts disagree on what "the same" means:
//!
//! - [`KeyMode::Identity`] hashes the host's [`ElementId`](crate::ElementId).
//!   Renaming an element keeps its key.
//! - [`KeyMode::Name`] hashes the library-qualified name. Keys survive a host
//!   reload that reassigns identities.
use blake3::Hasher;
use serde::{Deserialize, Serialize};

use crate::element::{Datablock, ElementKind, RenderMode};

/// 32-byte domain-separated cache key.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ElementKey(pub [u8; 32]);

impl ElementKey {
    /// Hash `parts` under the domain of `kind` (prefix `b"<kind>:"`).
    pub fn derive(kind: ElementKind, parts: &[&[u8]]) -> Self {
        let mut hasher = Hasher::new();
        hasher.update(kind.domain());
        for part in parts {
            // Length prefix keeps ("ab","c") and ("a","bc") apart.
            hasher.update(&(part.len() as u64).to_le_bytes());
            hasher.update(part);
        }
        Self(hasher.finalize().into())
    }

    /// Returns the canonical byte representation of this key.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// First 16 hex characters, enough to tell keys apart in names and logs.
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

/// Key plus the renderer-side name generated for it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementIdentity {
    /// Cache key.
    pub key: ElementKey,
    /// Stable renderer-side identifier.
    pub name: String,
}

/// Which key derivation a session uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyMode {
    /// Key by host identity.
    Identity,
    /// Key by normalized, library-qualified name.
    #[default]
    Name,
}

impl KeyMode {
    /// The derivation strategy for this mode.
    pub fn derivation(self) -> Box<dyn KeyDerivation> {
        match self {
            Self::Identity => Box::new(IdentityKeys),
            Self::Name => Box::new(NameKeys),
        }
    }
}

/// Pluggable per-element-kind key derivation.
pub trait KeyDerivation: Send + Sync {
    /// Mode this strategy implements.
    fn mode(&self) -> KeyMode;

    /// Key and name for a datablock of `kind`.
    fn identify(&self, kind: ElementKind, block: &Datablock) -> ElementIdentity;

    /// Key and name for mesh data, which differ per render mode and instancing.
    fn mesh(&self, block: &Datablock, mode: RenderMode, instanced: bool) -> ElementIdentity;
}

/// Keys derived from [`ElementId`](crate::ElementId).
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityKeys;

impl IdentityKeys {
    fn name_for(kind: ElementKind, key: &ElementKey) -> String {
        format!("{}{}", kind.name_prefix(), key.short_hex())
    }
}

impl KeyDerivation for IdentityKeys {
    fn mode(&self) -> KeyMode {
        KeyMode::Identity
    }

    fn identify(&self, kind: ElementKind, block: &Datablock) -> ElementIdentity {
        let key = ElementKey::derive(kind, &[block.id.0.to_le_bytes().as_slice()]);
        ElementIdentity {
            name: Self::name_for(kind, &key),
            key,
        }
    }

    fn mesh(&self, block: &Datablock, mode: RenderMode, instanced: bool) -> ElementIdentity {
        let key = ElementKey::derive(
            ElementKind::Mesh,
            &[
                block.id.0.to_le_bytes().as_slice(),
                &[mode_byte(mode)][..],
                &[u8::from(instanced)][..],
            ],
        );
        ElementIdentity {
            name: Self::name_for(ElementKind::Mesh, &key),
            key,
        }
    }
}

/// Keys derived from normalized, library-qualified names.
#[derive(Clone, Copy, Debug, Default)]
pub struct NameKeys;

impl KeyDerivation for NameKeys {
    fn mode(&self) -> KeyMode {
        KeyMode::Name
    }

    fn identify(&self, kind: ElementKind, block: &Datablock) -> ElementIdentity {
        let qualified = block.qualified_name();
        ElementIdentity {
            key: ElementKey::derive(kind, &[qualified.as_bytes()]),
            name: sanitize_name(&qualified),
        }
    }

    fn mesh(&self, block: &Datablock, mode: RenderMode, instanced: bool) -> ElementIdentity {
        let qualified = block.qualified_name();
        let key = ElementKey::derive(
            ElementKind::Mesh,
            &[
                qualified.as_bytes(),
                &[mode_byte(mode)][..],
                &[u8::from(instanced)][..],
            ],
        );
        let mut name = sanitize_name(&qualified);
        if mode == RenderMode::Preview {
            name.push_str("_preview");
        }
        if instanced {
            name.push_str("_inst");
        }
        ElementIdentity { key, name }
    }
}

const fn mode_byte(mode: RenderMode) -> u8 {
    match mode {
        RenderMode::Preview => 0,
        RenderMode::Final => 1,
    }
}

/// Reduce a host name to `[A-Za-z0-9_]`, the alphabet the renderer accepts
/// inside a dotted key segment.
///
/// Every other character becomes `_`. Names starting with a digit (or empty
/// names) get a leading `_`.
pub fn sanitize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 1);
    if name.chars().next().map_or(true, |c| c.is_ascii_digit()) {
        out.push('_');
    }
    out.extend(name.chars().map(|c| {
        if c.is_ascii_alphanumeric() || c == '_' {
            c
        } else {
            '_'
        }
    }));
    out
}
