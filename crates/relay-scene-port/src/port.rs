// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Renderer port trait defining what the exporter hands to the engine.

use relay_props::{PropertyBatch, PropertySet};

use crate::PortError;

/// Full configuration built on a cold start.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderConfig {
    /// Cumulative scene properties.
    pub scene: PropertySet,
    /// Engine / film / sampler configuration.
    pub config: PropertySet,
    /// Synchronization cycle that produced this configuration.
    pub cycle: u64,
}

/// Rendering engine port.
///
/// Implementors receive property sets and patches. They never see the host
/// scene.
///
/// # Ordering
///
/// Batches passed to [`apply_update`](RenderPort::apply_update) must be applied
/// in call order: a later definition of a key supersedes an earlier one and a
/// deleted key removes every earlier definition.
pub trait RenderPort {
    /// Build a fresh render session from a full configuration.
    fn build(&mut self, config: &RenderConfig) -> Result<(), PortError>;

    /// Overlay one pending batch onto the running session.
    fn apply_update(&mut self, batch: &PropertyBatch) -> Result<(), PortError>;

    /// Engine configuration changed on an incremental cycle.
    fn reconfigure(&mut self, config: &PropertySet) -> Result<(), PortError>;
}
