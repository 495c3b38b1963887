// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Conversion context handed to translators.
//!
//! The context owns the mutable borrow of every cache, the aggregator and the
//! dedup guards for the duration of one walk. Translators ask it for their
//! dependencies by name and get back renderer-side names; the context converts
//! each dependency through its cache at most once per pass.

use std::collections::BTreeSet;

use relay_app_core::ExportSettings;
use relay_props::{PropertyAggregator, PropertySet};
use relay_scene_port::{
    AuxOutput, Camera, Datablock, DuplicationSystem, ElementIdentity, ElementKey, ElementKind,
    ElementRef, KeyDerivation, Material, Medium, Object, ObjectKind, RenderMode, ResourceKind,
    Scene,
};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, warn};

use crate::cache::{ElementCache, ExporterRecord, SlotRecord};
use crate::error::{ConvertError, FallbackNotice};
use crate::guard::{Claim, DedupGuards};
use crate::names::{NameTable, Section};
use crate::report::SyncStats;
use crate::translate::{fallback_properties, Converter, TranslatorRegistry};

/// Renderer name of the material used for empty slots.
pub const DEFAULT_MATERIAL_NAME: &str = "relay_default_material";

/// Light group lights without an explicit group belong to.
pub const DEFAULT_LIGHT_GROUP: &str = "default";

/// Key holding the resolved default (world) medium.
pub const DEFAULT_MEDIUM_KEY: &str = "scene.world.volume.default";

/// Element kinds backed by an [`ElementCache`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CachedKind {
    Object,
    Mesh,
    Material,
    Texture,
    Light,
    Medium,
    Duplication,
}

impl CachedKind {
    pub(crate) const fn element_kind(self) -> ElementKind {
        match self {
            Self::Object => ElementKind::Object,
            Self::Mesh => ElementKind::Mesh,
            Self::Material => ElementKind::Material,
            Self::Texture => ElementKind::Texture,
            Self::Light => ElementKind::Light,
            Self::Medium => ElementKind::Medium,
            Self::Duplication => ElementKind::Duplication,
        }
    }

    pub(crate) const fn from_element(kind: ElementKind) -> Option<Self> {
        match kind {
            ElementKind::Object => Some(Self::Object),
            ElementKind::Mesh => Some(Self::Mesh),
            ElementKind::Material => Some(Self::Material),
            ElementKind::Texture => Some(Self::Texture),
            ElementKind::Light => Some(Self::Light),
            ElementKind::Medium => Some(Self::Medium),
            ElementKind::Duplication => Some(Self::Duplication),
            ElementKind::Camera | ElementKind::World => None,
        }
    }
}

impl From<ResourceKind> for CachedKind {
    fn from(kind: ResourceKind) -> Self {
        match kind {
            ResourceKind::Material => Self::Material,
            ResourceKind::Texture => Self::Texture,
            ResourceKind::Medium => Self::Medium,
        }
    }
}

/// One cache per element kind.
#[derive(Debug, Default)]
pub(crate) struct Caches {
    objects: ElementCache,
    meshes: ElementCache,
    materials: ElementCache,
    textures: ElementCache,
    lights: ElementCache,
    media: ElementCache,
    duplications: ElementCache,
}

impl Caches {
    pub(crate) fn get(&self, kind: CachedKind) -> &ElementCache {
        match kind {
            CachedKind::Object => &self.objects,
            CachedKind::Mesh => &self.meshes,
            CachedKind::Material => &self.materials,
            CachedKind::Texture => &self.textures,
            CachedKind::Light => &self.lights,
            CachedKind::Medium => &self.media,
            CachedKind::Duplication => &self.duplications,
        }
    }

    fn get_mut(&mut self, kind: CachedKind) -> &mut ElementCache {
        match kind {
            CachedKind::Object => &mut self.objects,
            CachedKind::Mesh => &mut self.meshes,
            CachedKind::Material => &mut self.materials,
            CachedKind::Texture => &mut self.textures,
            CachedKind::Light => &mut self.lights,
            CachedKind::Medium => &mut self.media,
            CachedKind::Duplication => &mut self.duplications,
        }
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &ElementCache> + '_ {
        [
            &self.objects,
            &self.meshes,
            &self.materials,
            &self.textures,
            &self.lights,
            &self.media,
            &self.duplications,
        ]
        .into_iter()
    }
}

/// What one pass discovered; reset at the start of every cycle.
#[derive(Debug, Default)]
pub(crate) struct PassState {
    pub(crate) light_groups: Vec<String>,
    pub(crate) aux_outputs: BTreeSet<AuxOutput>,
    pub(crate) fallbacks: Vec<FallbackNotice>,
    pub(crate) stats: SyncStats,
    meshes_converted: FxHashSet<ElementKey>,
}

/// Everything a session owns. Never shared between sessions.
#[derive(Debug, Default)]
pub(crate) struct SessionState {
    pub(crate) aggregator: PropertyAggregator,
    pub(crate) caches: Caches,
    pub(crate) camera: SlotRecord,
    pub(crate) world: SlotRecord,
    pub(crate) guards: DedupGuards,
    pub(crate) pass: PassState,
    pub(crate) force_full: bool,
    names: NameTable,
    implicit_names: FxHashMap<(String, String), String>,
    next_implicit: u64,
}

impl SessionState {
    pub(crate) fn begin_pass(&mut self) {
        self.pass = PassState::default();
    }

    /// Union of the properties owned by every record and slot.
    pub(crate) fn owned_union(&self) -> PropertySet {
        let mut union = PropertySet::new();
        for cache in self.caches.iter() {
            union.merge(&cache.owned_union());
        }
        union.merge(self.camera.properties());
        union.merge(self.world.properties());
        union
    }
}

/// Mutable view of a session while one scene is walked.
pub struct ConvertContext<'a> {
    scene: &'a Scene,
    settings: &'a ExportSettings,
    keys: &'a dyn KeyDerivation,
    registry: &'a TranslatorRegistry,
    state: &'a mut SessionState,
    /// Keys of the records currently being converted, innermost last.
    owners: Vec<ElementKey>,
}

impl<'a> ConvertContext<'a> {
    pub(crate) fn new(
        scene: &'a Scene,
        settings: &'a ExportSettings,
        keys: &'a dyn KeyDerivation,
        registry: &'a TranslatorRegistry,
        state: &'a mut SessionState,
    ) -> Self {
        Self {
            scene,
            settings,
            keys,
            registry,
            state,
            owners: Vec::new(),
        }
    }

    /// Scene being walked.
    pub fn scene(&self) -> &'a Scene {
        self.scene
    }

    /// Session export settings.
    pub fn settings(&self) -> &'a ExportSettings {
        self.settings
    }

    /// Preview or final.
    pub fn render_mode(&self) -> RenderMode {
        self.settings.render_mode
    }

    /// Convert (once per pass) the material `name` and return its renderer name.
    pub fn material(&mut self, name: &str) -> Result<String, ConvertError> {
        let scene = self.scene;
        let material = scene
            .materials
            .get(name)
            .ok_or_else(|| ConvertError::unresolved(ElementKind::Material, name))?;
        let identity = self.keys.identify(ElementKind::Material, &material.block);
        Ok(self.convert_shared(
            ResourceKind::Material,
            identity,
            &material.variant,
            ElementRef::Material(material),
        ))
    }

    /// Material for an object slot: the slot's material, or the default
    /// material when the slot is empty or its material is missing.
    ///
    /// A missing material is recorded as a fallback of `owner`.
    pub fn material_or_default(
        &mut self,
        slot: Option<&str>,
        owner_kind: ElementKind,
        owner: &str,
    ) -> String {
        let Some(name) = slot else {
            return self.default_material();
        };
        match self.material(name) {
            Ok(material) => material,
            Err(error) => {
                self.record_fallback(owner_kind, owner, error);
                self.default_material()
            }
        }
    }

    /// Convert (once per pass) the neutral default material.
    pub fn default_material(&mut self) -> String {
        let material = Material {
            block: Datablock::new(0, DEFAULT_MATERIAL_NAME),
            variant: "matte".to_owned(),
            params: {
                let mut params = PropertySet::new();
                params.set("kd", [0.75_f32, 0.75, 0.75]);
                params
            },
            ..Material::default()
        };
        let identity = ElementIdentity {
            key: ElementKey::derive(
                ElementKind::Material,
                &[b"relay:default-material".as_slice()],
            ),
            name: DEFAULT_MATERIAL_NAME.to_owned(),
        };
        self.convert_shared(
            ResourceKind::Material,
            identity,
            &material.variant,
            ElementRef::Material(&material),
        )
    }

    /// Convert (once per pass) the texture `name` and return its renderer name.
    pub fn texture(&mut self, name: &str) -> Result<String, ConvertError> {
        let scene = self.scene;
        let texture = scene
            .textures
            .get(name)
            .ok_or_else(|| ConvertError::unresolved(ElementKind::Texture, name))?;
        let identity = self.keys.identify(ElementKind::Texture, &texture.block);
        Ok(self.convert_shared(
            ResourceKind::Texture,
            identity,
            &texture.variant,
            ElementRef::Texture(texture),
        ))
    }

    /// Convert (once per pass) the medium `name` and return its renderer name.
    pub fn medium(&mut self, name: &str) -> Result<String, ConvertError> {
        let scene = self.scene;
        let medium = scene
            .media
            .get(name)
            .ok_or_else(|| ConvertError::unresolved(ElementKind::Medium, name))?;
        Ok(self.convert_medium(medium))
    }

    pub(crate) fn convert_medium(&mut self, medium: &Medium) -> String {
        let identity = self.keys.identify(ElementKind::Medium, &medium.block);
        self.convert_shared(
            ResourceKind::Medium,
            identity,
            &medium.variant,
            ElementRef::Medium(medium),
        )
    }

    /// Convert the mesh `name` in the session's render mode.
    ///
    /// Meshes are skipped when the cached record was converted at the same
    /// host revision. Returns `None` when the mesh produced no shape (its
    /// conversion failed).
    pub fn mesh(&mut self, name: &str, instanced: bool) -> Result<Option<String>, ConvertError> {
        let scene = self.scene;
        let mesh = scene
            .meshes
            .get(name)
            .ok_or_else(|| ConvertError::unresolved(ElementKind::Mesh, name))?;
        let identity = self
            .keys
            .mesh(&mesh.block, self.settings.render_mode, instanced);
        let (key, name) = self.claim(ElementKind::Mesh, identity);

        let fresh = self.state.caches.meshes.is_current(&key, mesh.revision)
            && (!self.state.force_full || self.state.pass.meshes_converted.contains(&key));
        if fresh {
            self.state.pass.stats.meshes_reused += 1;
        } else {
            self.state.pass.meshes_converted.insert(key);
            let converter = self.registry.converter(ElementKind::Mesh, &mesh.variant, name);
            self.convert_element(
                CachedKind::Mesh,
                key,
                converter,
                ElementRef::Mesh { mesh, instanced },
                Some(mesh.revision),
            );
        }
        Ok(self
            .state
            .caches
            .meshes
            .get(&key)
            .filter(|record| !record.properties.is_empty())
            .map(|record| record.generated_name().to_owned()))
    }

    /// Convert the light carried by `object`.
    ///
    /// Light records are keyed by the owning object: two objects instancing
    /// one light datablock are two lights.
    pub fn light(&mut self, object: &Object, light_name: &str) -> Result<String, ConvertError> {
        let scene = self.scene;
        let light = scene
            .lights
            .get(light_name)
            .ok_or_else(|| ConvertError::unresolved(ElementKind::Light, light_name))?;
        let identity = self.keys.identify(ElementKind::Light, &object.block);
        let (key, name) = self.claim(ElementKind::Light, identity);
        let converter = self.registry.converter(ElementKind::Light, &light.variant, name);
        Ok(self.convert_element(
            CachedKind::Light,
            key,
            converter,
            ElementRef::Light {
                light,
                transform: &object.transform,
            },
            None,
        ))
    }

    /// Convert a duplication system into its instances.
    pub fn duplication(&mut self, system: &DuplicationSystem) -> String {
        let identity = self.keys.identify(ElementKind::Duplication, &system.block);
        let (key, name) = self.claim(ElementKind::Duplication, identity);
        let converter = self
            .registry
            .converter(ElementKind::Duplication, "instances", name);
        self.convert_element(
            CachedKind::Duplication,
            key,
            converter,
            ElementRef::Duplication(system),
            None,
        )
    }

    /// Empty the record of an element that stopped contributing (hidden
    /// object, light turned into a mesh). The record itself stays cached.
    pub fn retire(&mut self, kind: ElementKind, block: &Datablock) {
        let Some(cached) = CachedKind::from_element(kind) else {
            return;
        };
        let key = self.keys.identify(kind, block).key;
        let state = &mut *self.state;
        let cache = state.caches.get_mut(cached);
        let Some(converter) = cache.get(&key).map(|record| record.converter.clone()) else {
            return;
        };
        cache.purge(&key, &mut state.aggregator);
        cache.commit(
            ExporterRecord {
                key,
                converter,
                properties: PropertySet::new(),
                revision: None,
            },
            &mut state.aggregator,
        );
    }

    /// Id of light group `group` (`None` or empty means the default group).
    ///
    /// Ids are assigned in discovery order within a pass.
    pub fn light_group(&mut self, group: Option<&str>) -> u32 {
        let group = group
            .filter(|g| !g.is_empty())
            .unwrap_or(DEFAULT_LIGHT_GROUP);
        let groups = &mut self.state.pass.light_groups;
        let index = match groups.iter().position(|g| g == group) {
            Some(index) => index,
            None => {
                groups.push(group.to_owned());
                groups.len() - 1
            }
        };
        u32::try_from(index).unwrap_or(u32::MAX)
    }

    /// Ask the film for an auxiliary output this pass.
    pub fn request_output(&mut self, output: AuxOutput) {
        self.state.pass.aux_outputs.insert(output);
    }

    /// Session-unique name for a texture synthesized on behalf of `owner`'s
    /// `channel`. The same owner/channel pair keeps its name for the whole
    /// session.
    pub fn implicit_texture_name(&mut self, owner: &str, channel: &str) -> String {
        let state = &mut *self.state;
        let next = &mut state.next_implicit;
        let requested = state
            .implicit_names
            .entry((owner.to_owned(), channel.to_owned()))
            .or_insert_with(|| {
                let name = format!("{owner}_implicit{next}");
                *next += 1;
                name
            })
            .clone();
        self.sub_name(ElementKind::Texture, &requested)
    }

    /// Renderer name for an extra entity the element being converted writes
    /// into `kind`'s section: a material slot, a duplicated instance.
    ///
    /// The name is reserved for that element for the whole session, so it
    /// never aliases another element's keys.
    pub fn sub_name(&mut self, kind: ElementKind, requested: &str) -> String {
        let owner = self.owners.last().copied().unwrap_or_else(|| {
            ElementKey::derive(kind, &[b"relay:unowned".as_slice(), requested.as_bytes()])
        });
        self.state.names.reserve(Section::of(kind), owner, requested)
    }

    /// Record that `name` needed a safe default this pass.
    pub fn record_fallback(&mut self, kind: ElementKind, name: &str, error: ConvertError) {
        warn!(%kind, name, %error, "substituting safe default");
        self.state.pass.fallbacks.push(FallbackNotice {
            kind,
            name: name.to_owned(),
            error,
        });
    }

    pub(crate) fn convert_object(&mut self, object: &Object) -> String {
        let identity = self.keys.identify(ElementKind::Object, &object.block);
        let (key, name) = self.claim(ElementKind::Object, identity);
        let variant = match object.kind {
            ObjectKind::Mesh { .. } => "mesh",
            ObjectKind::Light { .. } => "light",
            ObjectKind::Empty => "empty",
        };
        if !object.visible {
            self.state.pass.stats.hidden_objects += 1;
        }
        let converter = self.registry.converter(ElementKind::Object, variant, name);
        self.convert_element(
            CachedKind::Object,
            key,
            converter,
            ElementRef::Object(object),
            None,
        )
    }

    pub(crate) fn convert_camera(&mut self, camera: Option<&Camera>) {
        let state = &mut *self.state;
        state.camera.purge(&mut state.aggregator);

        const NAME: &str = "camera";
        let properties = match camera {
            Some(camera) => {
                let converter = self.registry.converter(
                    ElementKind::Camera,
                    camera.projection.variant(),
                    NAME.to_owned(),
                );
                match converter.convert(ElementRef::Camera(camera), self) {
                    Ok(properties) => properties,
                    Err(error) => {
                        self.record_fallback(ElementKind::Camera, NAME, error);
                        fallback_properties(ElementKind::Camera, NAME)
                    }
                }
            }
            None => fallback_properties(ElementKind::Camera, NAME),
        };
        self.state.pass.stats.count(ElementKind::Camera);
        let state = &mut *self.state;
        state.camera.commit(properties, &mut state.aggregator);
    }

    pub(crate) fn set_default_medium(&mut self, medium: Option<&str>) {
        let state = &mut *self.state;
        state.world.purge(&mut state.aggregator);
        let mut properties = PropertySet::new();
        if let Some(name) = medium {
            properties.set(DEFAULT_MEDIUM_KEY, name);
        }
        state.world.commit(properties, &mut state.aggregator);
    }

    /// Reserve the renderer name of a record.
    fn claim(&mut self, kind: ElementKind, identity: ElementIdentity) -> (ElementKey, String) {
        let ElementIdentity { key, name } = identity;
        let name = self.state.names.reserve(Section::of(kind), key, &name);
        (key, name)
    }

    /// Claim a shared resource and convert it on first claim this pass.
    fn convert_shared(
        &mut self,
        resource: ResourceKind,
        identity: ElementIdentity,
        variant: &str,
        element: ElementRef<'_>,
    ) -> String {
        let cached = CachedKind::from(resource);
        let (key, name) = self.claim(cached.element_kind(), identity);
        if self.state.guards.request(resource, key) == Claim::Duplicate {
            return name;
        }
        let converter = self.registry.converter(resource.into(), variant, name);
        self.convert_element(cached, key, converter, element, None)
    }

    /// Purge the old record, convert, substitute on failure, commit.
    fn convert_element(
        &mut self,
        kind: CachedKind,
        key: ElementKey,
        converter: Converter,
        element: ElementRef<'_>,
        revision: Option<u64>,
    ) -> String {
        let element_kind = kind.element_kind();
        let name = converter.generated_name().to_owned();
        {
            let state = &mut *self.state;
            state.caches.get(kind).purge(&key, &mut state.aggregator);
        }

        self.owners.push(key);
        let converted = converter.convert(element, self);
        self.owners.pop();
        let properties = match converted {
            Ok(properties) => properties,
            Err(error) => {
                self.record_fallback(element_kind, &name, error);
                fallback_properties(element_kind, &name)
            }
        };
        debug!(kind = %element_kind, name = %name, keys = properties.len(), "converted");

        let state = &mut *self.state;
        state.pass.stats.count(element_kind);
        state.caches.get_mut(kind).commit(
            ExporterRecord {
                key,
                converter,
                properties,
                revision,
            },
            &mut state.aggregator,
        );
        name
    }
}

#[cfg(test)]
impl ConvertContext<'_> {
    /// Cumulative aggregate so far.
    pub(crate) fn test_aggregate(&self) -> &PropertySet {
        self.state.aggregator.scene_properties()
    }
}

/// Run `f` against a fresh session walking `scene` with default settings.
#[cfg(test)]
pub(crate) fn with_test_context<R>(
    scene: &Scene,
    f: impl FnOnce(&mut ConvertContext<'_>) -> R,
) -> R {
    let settings = ExportSettings::default();
    let keys = settings.key_mode.derivation();
    let registry = TranslatorRegistry::default();
    let mut state = SessionState::default();
    let mut ctx = ConvertContext::new(scene, &settings, keys.as_ref(), &registry, &mut state);
    f(&mut ctx)
}
