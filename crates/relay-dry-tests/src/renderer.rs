// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Mock renderer for headless testing of the export pipeline.
//!
//! [`MockRenderer`] keeps the property document it was built with and
//! overlays every batch onto it, so tests can check that what the renderer
//! ends up holding equals the exporter's cumulative view.

use relay_props::{PropertyBatch, PropertySet};
use relay_scene_port::{PortError, RenderConfig, RenderPort};

/// Headless [`RenderPort`] that records what it received.
#[derive(Debug, Default)]
pub struct MockRenderer {
    /// Scene properties as the renderer sees them.
    pub scene: PropertySet,
    /// Current engine configuration.
    pub config: PropertySet,
    /// Batches received since the last build, in order.
    pub batches: Vec<PropertyBatch>,
    /// Number of `build` calls that succeeded.
    pub build_count: u32,
    /// Number of `apply_update` calls that succeeded.
    pub update_count: u32,
    /// Number of `reconfigure` calls that succeeded.
    pub reconfigure_count: u32,
    /// Cycle of the last build.
    pub built_cycle: Option<u64>,
    fail_next: Option<PortError>,
}

impl MockRenderer {
    /// Unbuilt renderer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next port call fail with `error`.
    pub fn fail_next(&mut self, error: PortError) {
        self.fail_next = Some(error);
    }

    /// Whether a session was ever built.
    pub fn is_built(&self) -> bool {
        self.built_cycle.is_some()
    }

    /// Last batch received.
    pub fn last_batch(&self) -> Option<&PropertyBatch> {
        self.batches.last()
    }

    fn check(&mut self) -> Result<(), PortError> {
        match self.fail_next.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl RenderPort for MockRenderer {
    fn build(&mut self, config: &RenderConfig) -> Result<(), PortError> {
        self.check()?;
        self.scene = config.scene.clone();
        self.config = config.config.clone();
        self.batches.clear();
        self.build_count += 1;
        self.built_cycle = Some(config.cycle);
        Ok(())
    }

    fn apply_update(&mut self, batch: &PropertyBatch) -> Result<(), PortError> {
        if !self.is_built() {
            return Err(PortError::Closed);
        }
        self.check()?;
        batch.apply_to(&mut self.scene);
        self.batches.push(batch.clone());
        self.update_count += 1;
        Ok(())
    }

    fn reconfigure(&mut self, config: &PropertySet) -> Result<(), PortError> {
        if !self.is_built() {
            return Err(PortError::Closed);
        }
        self.check()?;
        self.config = config.clone();
        self.reconfigure_count += 1;
        Ok(())
    }
}
