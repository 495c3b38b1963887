// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scene port contract for Relay.
//!
//! This crate defines what the exporter reads from the host application and
//! what it hands to the rendering engine. It contains NO conversion logic;
//! that lives in `relay-sync`.
//!
//! # Design Principles
//!
//! - **The host owns the scene** — the exporter only reads a snapshot of it.
//! - **Renderers are dumb** — they receive property sets and patches.
//! - **Keys are stable** — element keys derive from host identity or names,
//!   never from the order elements are visited.

use thiserror::Error;

mod cancel;
mod element;
pub mod keys;
mod port;
mod scene;

pub use cancel::{CancelFlag, Cancellation, NeverCancel};
pub use element::{Datablock, ElementId, ElementKind, RenderMode, ResourceKind};
pub use keys::{ElementIdentity, ElementKey, KeyDerivation, KeyMode};
pub use port::{RenderConfig, RenderPort};
pub use scene::{
    AuxOutput, Camera, DuplicationSystem, ElementRef, HostData, Light, Material, Medium, MeshData,
    Object, ObjectKind, Projection, Scene, Texture, Transform, World, IDENTITY,
};

/// Error reported by a [`RenderPort`] implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PortError {
    /// The renderer refused the property set (parse or validation failure).
    #[error("renderer rejected properties: {0}")]
    Rejected(String),
    /// The render session is gone (closed by the user or the host).
    #[error("render session closed")]
    Closed,
}
