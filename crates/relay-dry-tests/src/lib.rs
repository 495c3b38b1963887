// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared test doubles and fixtures for Relay crates.
#![forbid(unsafe_code)]
//!
//! # Modules
//!
//! - [`config`] - In-memory config store fake for testing without filesystem
//! - [`renderer`] - Mock render port that overlays batches
//! - [`scenes`] - Host scene builders
//! - [`translators`] - Recording, failing and scripted translators, plus a
//!   counting cancellation poll

pub mod config;
pub mod renderer;
pub mod scenes;
pub mod translators;

pub use config::InMemoryConfigStore;
pub use renderer::MockRenderer;
pub use scenes::{offset, shared_mesh_scene, SceneBuilder};
pub use translators::{
    cancel_after, recording_registry, CallLog, FailingTranslator, RecordingTranslator,
    ScriptedTranslator,
};
