// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Export coordinator: one session, many synchronization cycles.
//!
//! A cycle walks the host scene in a fixed order (camera, media, objects,
//! configuration) and flushes exactly one pending batch to the renderer. The
//! first cycle (and any cycle after a port failure) builds the renderer from
//! the cumulative view instead of sending a batch.

use relay_app_core::ExportSettings;
use relay_props::{PropertyAggregator, PropertySet};
use relay_scene_port::{
    Cancellation, ElementKind, HostData, KeyDerivation, Medium, RenderConfig, RenderPort, Scene,
};
use tracing::{debug, info, instrument, warn};

use crate::cache::{ElementCache, SlotRecord};
use crate::config::build_config;
use crate::context::{CachedKind, ConvertContext, SessionState};
use crate::error::SyncError;
use crate::report::SyncReport;
use crate::translate::TranslatorRegistry;

/// Where the coordinator is within (or between) cycles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncPhase {
    /// Nothing flushed yet.
    Init,
    /// Converting the camera.
    Camera,
    /// Converting every scene's media and resolving the default medium.
    Media,
    /// Walking top-level objects.
    Objects,
    /// Building the renderer configuration.
    Config,
    /// Last cycle flushed (or was cancelled after an earlier flush).
    Flushed,
}

/// Medium the renderer should assume around everything.
///
/// The camera's exterior medium wins when it belongs to the scene's medium
/// collection; otherwise the world's default exterior, if the scene has it.
pub fn resolve_default_medium(scene: &Scene) -> Option<&Medium> {
    let from_camera = scene
        .camera
        .as_ref()
        .and_then(|camera| camera.exterior_medium.as_deref())
        .and_then(|name| scene.media.get(name));
    from_camera.or_else(|| {
        scene
            .world
            .default_exterior
            .as_deref()
            .and_then(|name| scene.media.get(name))
    })
}

/// Drives synchronization cycles for one export session.
///
/// Owns every cache, guard and the aggregator; nothing is shared with other
/// sessions.
pub struct ExportCoordinator {
    settings: ExportSettings,
    keys: Box<dyn KeyDerivation>,
    registry: TranslatorRegistry,
    state: SessionState,
    phase: SyncPhase,
    cycle: u64,
    last_config: Option<RenderConfig>,
    needs_rebuild: bool,
}

impl ExportCoordinator {
    /// Session using the built-in translators.
    pub fn new(settings: ExportSettings) -> Self {
        Self::with_registry(settings, TranslatorRegistry::default())
    }

    /// Session using `registry` for translator lookup.
    pub fn with_registry(settings: ExportSettings, registry: TranslatorRegistry) -> Self {
        Self {
            keys: settings.key_mode.derivation(),
            settings,
            registry,
            state: SessionState::default(),
            phase: SyncPhase::Init,
            cycle: 0,
            last_config: None,
            needs_rebuild: false,
        }
    }

    /// Replace the key derivation. Only meaningful before the first cycle.
    pub fn with_key_derivation(mut self, keys: Box<dyn KeyDerivation>) -> Self {
        self.keys = keys;
        self
    }

    /// Session settings.
    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    /// Resize the film. Takes effect on the next cycle as a reconfigure.
    pub fn set_film_size(&mut self, width: u32, height: u32) {
        self.settings.film_width = width;
        self.settings.film_height = height;
    }

    /// Current phase.
    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    /// Number of cycles started.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Configuration of the last successful flush.
    pub fn last_config(&self) -> Option<&RenderConfig> {
        self.last_config.as_ref()
    }

    /// The session's aggregator.
    pub fn aggregator(&self) -> &PropertyAggregator {
        &self.state.aggregator
    }

    /// Cumulative scene properties.
    pub fn scene_properties(&self) -> &PropertySet {
        self.state.aggregator.scene_properties()
    }

    /// Cache backing `kind`; `None` for the camera and world slots.
    pub fn cache(&self, kind: ElementKind) -> Option<&ElementCache> {
        CachedKind::from_element(kind).map(|kind| self.state.caches.get(kind))
    }

    /// Camera slot.
    pub fn camera_record(&self) -> &SlotRecord {
        &self.state.camera
    }

    /// World (default medium) slot.
    pub fn world_record(&self) -> &SlotRecord {
        &self.state.world
    }

    /// Union of every record's owned properties. Equals
    /// [`scene_properties`](Self::scene_properties) between cycles.
    pub fn owned_union(&self) -> PropertySet {
        self.state.owned_union()
    }

    /// Reconvert everything and rebuild the renderer on the next cycle.
    pub fn request_full_rebuild(&mut self) {
        self.needs_rebuild = true;
        self.state.force_full = true;
    }

    /// Run one synchronization cycle against `port`.
    ///
    /// `cancel` is polled before every top-level object. A cancelled cycle
    /// leaves the last configuration untouched; its partial conversions stay
    /// pending and are flushed by the next completed cycle.
    #[instrument(skip_all, fields(cycle = self.cycle + 1, scene = %host.active.name))]
    pub fn sync(
        &mut self,
        host: &HostData,
        cancel: &mut dyn Cancellation,
        port: &mut dyn RenderPort,
    ) -> Result<SyncReport, SyncError> {
        self.cycle += 1;
        let cold = self.last_config.is_none() || self.needs_rebuild;
        self.state.begin_pass();
        let scene = &host.active;

        self.phase = SyncPhase::Camera;
        self.context(scene).convert_camera(scene.camera.as_ref());

        self.phase = SyncPhase::Media;
        self.sync_media(host);

        self.phase = SyncPhase::Objects;
        if let Err(err) = self.sync_objects(scene, cancel) {
            self.abort_pass();
            return Err(err);
        }

        self.phase = SyncPhase::Config;
        let config = build_config(
            &self.settings,
            &self.state.pass.light_groups,
            &self.state.pass.aux_outputs,
        );

        self.flush(config, cold, port)
    }

    fn context<'s>(&'s mut self, scene: &'s Scene) -> ConvertContext<'s> {
        ConvertContext::new(
            scene,
            &self.settings,
            self.keys.as_ref(),
            &self.registry,
            &mut self.state,
        )
    }

    fn sync_media(&mut self, host: &HostData) {
        for scene in host.scenes() {
            let mut ctx = self.context(scene);
            for medium in scene.media.values() {
                ctx.convert_medium(medium);
            }
        }

        let scene = &host.active;
        let mut ctx = self.context(scene);
        let default = resolve_default_medium(scene).map(|medium| ctx.convert_medium(medium));
        debug!(default_medium = ?default, "resolved default medium");
        ctx.set_default_medium(default.as_deref());
    }

    fn sync_objects(
        &mut self,
        scene: &Scene,
        cancel: &mut dyn Cancellation,
    ) -> Result<(), SyncError> {
        let mut ctx = self.context(scene);
        for (index, object) in scene.objects.iter().enumerate() {
            if cancel.is_cancelled() {
                info!(index, total = scene.objects.len(), "sync cancelled");
                return Err(SyncError::Cancelled { index });
            }
            ctx.convert_object(object);
        }
        Ok(())
    }

    fn abort_pass(&mut self) {
        self.state.guards.clear();
        self.phase = if self.last_config.is_some() {
            SyncPhase::Flushed
        } else {
            SyncPhase::Init
        };
    }

    fn flush(
        &mut self,
        config: PropertySet,
        cold: bool,
        port: &mut dyn RenderPort,
    ) -> Result<SyncReport, SyncError> {
        let batch = self.state.aggregator.pop();
        self.state.guards.clear();

        let config_changed = self
            .last_config
            .as_ref()
            .map_or(true, |last| last.config != config);
        let render_config = RenderConfig {
            scene: self.state.aggregator.scene_properties().clone(),
            config,
            cycle: self.cycle,
        };

        let sent = if cold {
            port.build(&render_config)
        } else {
            port.apply_update(&batch).and_then(|()| {
                if config_changed {
                    port.reconfigure(&render_config.config)
                } else {
                    Ok(())
                }
            })
        };
        if let Err(err) = sent {
            warn!(%err, cold, "render port rejected flush; next cycle rebuilds");
            self.needs_rebuild = true;
            self.phase = if self.last_config.is_some() {
                SyncPhase::Flushed
            } else {
                SyncPhase::Init
            };
            return Err(err.into());
        }

        self.needs_rebuild = false;
        self.state.force_full = false;
        self.phase = SyncPhase::Flushed;

        let pass = std::mem::take(&mut self.state.pass);
        let report = SyncReport {
            cycle: self.cycle,
            cold,
            config_changed,
            set_keys: batch.set.len(),
            deleted_keys: batch.deleted.len(),
            light_groups: pass.light_groups,
            aux_outputs: pass.aux_outputs.into_iter().collect(),
            fallbacks: pass.fallbacks,
            stats: pass.stats,
        };
        info!(
            cold,
            set = report.set_keys,
            deleted = report.deleted_keys,
            converted = report.stats.total_converted(),
            reused = report.stats.meshes_reused,
            fallbacks = report.fallbacks.len(),
            "flushed"
        );
        self.last_config = Some(render_config);
        Ok(report)
    }
}

impl core::fmt::Debug for ExportCoordinator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ExportCoordinator")
            .field("key_mode", &self.keys.mode())
            .field("phase", &self.phase)
            .field("cycle", &self.cycle)
            .field("needs_rebuild", &self.needs_rebuild)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_scene_port::{Camera, Datablock, World};

    fn medium(id: u64, name: &str) -> Medium {
        Medium {
            block: Datablock::new(id, name),
            variant: "homogeneous".to_owned(),
            ..Medium::default()
        }
    }

    #[test]
    fn camera_medium_beats_world_default() {
        let mut scene = Scene::default();
        scene.media.insert("Fog".to_owned(), medium(1, "Fog"));
        scene.media.insert("Haze".to_owned(), medium(2, "Haze"));
        scene.world = World {
            default_exterior: Some("Haze".to_owned()),
        };
        scene.camera = Some(Camera {
            exterior_medium: Some("Fog".to_owned()),
            ..Camera::default()
        });
        assert_eq!(resolve_default_medium(&scene).map(|m| m.block.name.as_str()), Some("Fog"));
    }

    #[test]
    fn foreign_camera_medium_falls_back_to_world() {
        let mut scene = Scene::default();
        scene.media.insert("Haze".to_owned(), medium(2, "Haze"));
        scene.world.default_exterior = Some("Haze".to_owned());
        scene.camera = Some(Camera {
            exterior_medium: Some("Elsewhere".to_owned()),
            ..Camera::default()
        });
        assert_eq!(resolve_default_medium(&scene).map(|m| m.block.name.as_str()), Some("Haze"));

        scene.world.default_exterior = Some("AlsoElsewhere".to_owned());
        assert!(resolve_default_medium(&scene).is_none());
    }

    #[test]
    fn fresh_coordinator_is_idle() {
        let coordinator = ExportCoordinator::new(ExportSettings::default());
        assert_eq!(coordinator.phase(), SyncPhase::Init);
        assert_eq!(coordinator.cycle(), 0);
        assert!(coordinator.last_config().is_none());
        assert!(coordinator.scene_properties().is_empty());
        assert!(coordinator.cache(ElementKind::Camera).is_none());
        assert!(coordinator.cache(ElementKind::Mesh).is_some_and(ElementCache::is_empty));
    }
}
