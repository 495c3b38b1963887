// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Saved export settings shared by every Relay host adapter.

use relay_scene_port::{AuxOutput, KeyMode, RenderMode};
use serde::{Deserialize, Serialize};

/// Config key the settings are stored under.
pub const SETTINGS_KEY: &str = "export";

/// Per-session export settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// How element keys and renderer names are derived.
    pub key_mode: KeyMode,
    /// Viewport preview or final render.
    pub render_mode: RenderMode,
    /// Export meshes once and reference them from objects.
    pub use_instancing: bool,
    /// Render engine type (`renderengine.type`).
    pub engine: String,
    /// Sampler type (`sampler.type`).
    pub sampler: String,
    /// Film width in pixels.
    pub film_width: u32,
    /// Film height in pixels.
    pub film_height: u32,
    /// Emit one radiance output per light group.
    pub light_group_outputs: bool,
    /// Outputs requested regardless of materials.
    pub extra_outputs: Vec<AuxOutput>,
    /// Halt after this many samples per pixel (0 = never).
    pub halt_spp: u32,
    /// Halt after this many seconds (0 = never).
    pub halt_time_secs: u32,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            key_mode: KeyMode::Name,
            render_mode: RenderMode::Final,
            use_instancing: true,
            engine: "PATHCPU".to_owned(),
            sampler: "SOBOL".to_owned(),
            film_width: 1920,
            film_height: 1080,
            light_group_outputs: true,
            extra_outputs: Vec::new(),
            halt_spp: 0,
            halt_time_secs: 0,
        }
    }
}

impl ExportSettings {
    /// Settings for an interactive viewport session.
    pub fn preview() -> Self {
        Self {
            render_mode: RenderMode::Preview,
            engine: "RTPATHCPU".to_owned(),
            sampler: "RTPATHCPUSAMPLER".to_owned(),
            light_group_outputs: false,
            ..Self::default()
        }
    }

    /// Reject settings no render session can start from.
    pub fn validate(&self) -> Result<(), String> {
        if self.film_width == 0 || self.film_height == 0 {
            return Err(format!(
                "film size {}x{} has no pixels",
                self.film_width, self.film_height
            ));
        }
        if self.engine.trim().is_empty() {
            return Err("render engine is empty".to_owned());
        }
        if self.sampler.trim().is_empty() {
            return Err("sampler is empty".to_owned());
        }
        Ok(())
    }
}
