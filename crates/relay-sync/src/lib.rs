// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Incremental scene → property-set synchronization for Relay.
//!
//! An [`ExportCoordinator`] turns host scene snapshots into the flat property
//! document a rendering engine consumes, and keeps that document up to date
//! across repeated cycles by sending only what changed.
//!
//! # Design Principles
//!
//! - **Records own keys** — every converted element remembers exactly the
//!   keys it contributed; reconverting it first purges those keys, so no
//!   stale property outlives its element.
//! - **One conversion per pass** — shared materials, textures and media are
//!   claimed through [`DedupGuards`] and converted once per cycle.
//! - **Failures stay local** — an element that fails to convert is replaced by
//!   a safe default and reported in [`SyncReport::fallbacks`].
//! - **One batch per cycle** — the pending delta is popped exactly once, when
//!   the cycle flushes.

mod builtin;
mod cache;
mod config;
mod context;
mod coordinator;
mod error;
mod guard;
mod names;
mod report;
mod translate;

pub use builtin::{
    CameraTranslator, DuplicationTranslator, EmptyTranslator, LightTranslator,
    MaterialTranslator, ObjectTranslator, ShapeTranslator, TextureTranslator, VolumeTranslator,
};
pub use cache::{ElementCache, ExporterRecord, SlotRecord};
pub use config::{build_config, BEAUTY_OUTPUT, LIGHT_GROUP_OUTPUT};
pub use context::{
    ConvertContext, DEFAULT_LIGHT_GROUP, DEFAULT_MATERIAL_NAME, DEFAULT_MEDIUM_KEY,
};
pub use coordinator::{resolve_default_medium, ExportCoordinator, SyncPhase};
pub use error::{ConvertError, FallbackNotice, SyncError};
pub use guard::{Claim, DedupGuard, DedupGuards};
pub use report::{SyncReport, SyncStats};
pub use translate::{fallback_properties, Converter, Translator, TranslatorRegistry, ERROR_COLOR};
