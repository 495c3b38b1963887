// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Element-scope and cycle-scope errors.

use relay_scene_port::{ElementKind, PortError};
use thiserror::Error;

/// Failure converting a single element.
///
/// Never escapes a cycle: the element's safe default is substituted and the
/// failure is recorded as a [`FallbackNotice`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvertError {
    /// Malformed input or a translator-specific failure.
    #[error("{kind} conversion failed: {reason}")]
    Conversion {
        /// Kind of the failing element.
        kind: ElementKind,
        /// Human-readable cause.
        reason: String,
    },
    /// A referenced sub-resource does not exist in the scene.
    #[error("unresolved {kind} reference `{name}`")]
    UnresolvedReference {
        /// Kind of the missing element.
        kind: ElementKind,
        /// Name that failed to resolve.
        name: String,
    },
}

impl ConvertError {
    /// Shorthand for [`ConvertError::Conversion`].
    pub fn conversion(kind: ElementKind, reason: impl Into<String>) -> Self {
        Self::Conversion {
            kind,
            reason: reason.into(),
        }
    }

    /// Shorthand for [`ConvertError::UnresolvedReference`].
    pub fn unresolved(kind: ElementKind, name: impl Into<String>) -> Self {
        Self::UnresolvedReference {
            kind,
            name: name.into(),
        }
    }

    /// Whether this is a non-fatal missing reference rather than a failure.
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::UnresolvedReference { .. })
    }
}

/// Failure of a whole synchronization cycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// The host cancelled during the object walk. No configuration was
    /// produced; the previously flushed one is still valid.
    #[error("sync cancelled before object {index}")]
    Cancelled {
        /// Index of the first object that was not converted.
        index: usize,
    },
    /// The render port refused the flush.
    #[error("render port failed: {0}")]
    Port(#[from] PortError),
}

/// One element that needed its safe default this cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackNotice {
    /// Kind of the substituted element.
    pub kind: ElementKind,
    /// Renderer-side name of the substituted element.
    pub name: String,
    /// What went wrong.
    pub error: ConvertError,
}
