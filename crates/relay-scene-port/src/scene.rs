// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Host scene snapshot read by the exporter.
//!
//! These types are plain data filled in by the host adapter before each
//! synchronization cycle. Resources are referenced by name within their scene.

use std::collections::BTreeMap;

use relay_props::PropertySet;
use serde::{Deserialize, Serialize};

use crate::element::Datablock;

/// Column-major 4x4 world transform.
pub type Transform = [f32; 16];

/// Identity transform.
pub const IDENTITY: Transform = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

/// Camera projection type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Projection {
    /// Perspective projection.
    #[default]
    Perspective,
    /// Orthographic projection.
    Orthographic,
}

impl Projection {
    /// Variant tag used to pick a camera translator.
    pub const fn variant(self) -> &'static str {
        match self {
            Self::Perspective => "perspective",
            Self::Orthographic => "orthographic",
        }
    }
}

/// The active scene camera.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    /// Identity of the camera object.
    pub block: Datablock,
    /// Projection type.
    pub projection: Projection,
    /// Eye position in world space.
    pub position: [f32; 3],
    /// Look-at target in world space.
    pub target: [f32; 3],
    /// Up vector.
    pub up: [f32; 3],
    /// Vertical field of view in degrees (perspective).
    pub fov_degrees: f32,
    /// Orthographic scale.
    pub ortho_scale: f32,
    /// Name of the medium the camera sits in, if any.
    pub exterior_medium: Option<String>,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            block: Datablock::new(0, "Camera"),
            projection: Projection::Perspective,
            position: [0.0, 0.0, 5.0],
            target: [0.0, 0.0, 0.0],
            up: [0.0, 1.0, 0.0],
            fov_degrees: 49.1,
            ortho_scale: 10.0,
            exterior_medium: None,
        }
    }
}

/// Auxiliary output channels a material can ask the film to produce.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuxOutput {
    /// Per-material id mask.
    MaterialId,
    /// Per-object id mask.
    ObjectId,
    /// Emitted radiance only.
    Emission,
    /// Surface albedo.
    Albedo,
    /// Shading normal.
    ShadingNormal,
    /// Camera depth.
    Depth,
    /// Alpha coverage.
    Alpha,
}

impl AuxOutput {
    /// Film output type name understood by the renderer.
    pub const fn output_type(self) -> &'static str {
        match self {
            Self::MaterialId => "MATERIAL_ID",
            Self::ObjectId => "OBJECT_ID",
            Self::Emission => "EMISSION",
            Self::Albedo => "ALBEDO",
            Self::ShadingNormal => "SHADING_NORMAL",
            Self::Depth => "DEPTH",
            Self::Alpha => "ALPHA",
        }
    }
}

/// Surface material.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Material {
    /// Identity.
    pub block: Datablock,
    /// Material model tag (`matte`, `glossy2`, `mix`, ...).
    pub variant: String,
    /// Model parameters keyed by channel name (`kd`, `ks`, `emission`, ...).
    pub params: PropertySet,
    /// Channel name → texture name.
    pub textures: BTreeMap<String, String>,
    /// Operand slot → material name (mix materials).
    pub operands: BTreeMap<String, String>,
    /// Medium inside the surface.
    pub interior_medium: Option<String>,
    /// Medium outside the surface.
    pub exterior_medium: Option<String>,
    /// Light group of the emission, `None` for the default group.
    pub light_group: Option<String>,
    /// Auxiliary outputs this material asks for.
    pub aux_outputs: Vec<AuxOutput>,
}

impl Material {
    /// Whether the material emits light.
    pub fn is_emissive(&self) -> bool {
        self.params.contains("emission")
    }
}

/// Texture node.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Texture {
    /// Identity.
    pub block: Datablock,
    /// Texture type tag (`imagemap`, `checkerboard3d`, `scale`, ...).
    pub variant: String,
    /// Type parameters.
    pub params: PropertySet,
    /// Input slot → texture name. Textures may feed textures.
    pub inputs: BTreeMap<String, String>,
}

/// Light source datablock.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Light {
    /// Identity.
    pub block: Datablock,
    /// Light type tag (`point`, `spot`, `sun`, `area`, ...).
    pub variant: String,
    /// Type parameters.
    pub params: PropertySet,
    /// Light group, `None` for the default group.
    pub light_group: Option<String>,
}

/// Participating medium.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Medium {
    /// Identity.
    pub block: Datablock,
    /// Volume type tag (`clear`, `homogeneous`, `heterogeneous`).
    pub variant: String,
    /// Type parameters.
    pub params: PropertySet,
}

/// Mesh geometry data.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    /// Identity.
    pub block: Datablock,
    /// Host update counter; bumped whenever the geometry changes.
    pub revision: u64,
    /// Shape type tag (usually `mesh`).
    pub variant: String,
    /// Shape parameters.
    pub params: PropertySet,
}

/// Particle or duplication system instancing one mesh many times.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DuplicationSystem {
    /// Identity.
    pub block: Datablock,
    /// Name of the mesh every instance uses.
    pub instance_mesh: String,
    /// Material of every instance; `None` uses the default material.
    pub material: Option<String>,
    /// World transform per instance.
    pub transforms: Vec<Transform>,
}

/// What a top-level object carries.
#[derive(Clone, Debug, PartialEq)]
pub enum ObjectKind {
    /// Geometry with per-slot materials.
    Mesh {
        /// Mesh data name.
        mesh: String,
        /// Material per slot; `None` slots use the default material.
        material_slots: Vec<Option<String>>,
    },
    /// A light instance.
    Light {
        /// Light datablock name.
        light: String,
    },
    /// Nothing renderable of its own (may still carry duplications).
    Empty,
}

/// Top-level scene object.
#[derive(Clone, Debug, PartialEq)]
pub struct Object {
    /// Identity.
    pub block: Datablock,
    /// Payload.
    pub kind: ObjectKind,
    /// World transform.
    pub transform: Transform,
    /// Hidden objects are not exported.
    pub visible: bool,
    /// Duplication systems emitted by this object.
    pub duplications: Vec<DuplicationSystem>,
}

/// Scene-wide world settings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct World {
    /// Default exterior medium name for the whole scene.
    pub default_exterior: Option<String>,
}

/// One host scene.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
    /// Scene name.
    pub name: String,
    /// Active camera.
    pub camera: Option<Camera>,
    /// World settings.
    pub world: World,
    /// Top-level objects in host enumeration order.
    pub objects: Vec<Object>,
    /// Mesh data by name.
    pub meshes: BTreeMap<String, MeshData>,
    /// Materials by name.
    pub materials: BTreeMap<String, Material>,
    /// Textures by name.
    pub textures: BTreeMap<String, Texture>,
    /// Light datablocks by name.
    pub lights: BTreeMap<String, Light>,
    /// The scene's medium collection.
    pub media: BTreeMap<String, Medium>,
}

/// Everything loaded in the host: the active scene plus any other scenes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HostData {
    /// Scene being rendered.
    pub active: Scene,
    /// Other loaded scenes (their media still get exported).
    pub others: Vec<Scene>,
}

impl HostData {
    /// Host data holding a single scene.
    pub fn new(active: Scene) -> Self {
        Self {
            active,
            others: Vec::new(),
        }
    }

    /// Every loaded scene, active first.
    pub fn scenes(&self) -> impl Iterator<Item = &Scene> + '_ {
        core::iter::once(&self.active).chain(self.others.iter())
    }
}

/// Borrowed view of the element a translator converts.
#[derive(Clone, Copy, Debug)]
pub enum ElementRef<'a> {
    /// The active camera.
    Camera(&'a Camera),
    /// A top-level object.
    Object(&'a Object),
    /// Mesh data in the given render mode / instancing flavour.
    Mesh {
        /// Mesh data.
        mesh: &'a MeshData,
        /// Exported as a shared instance source.
        instanced: bool,
    },
    /// A material.
    Material(&'a Material),
    /// A texture.
    Texture(&'a Texture),
    /// A light instanced by an object.
    Light {
        /// Light datablock.
        light: &'a Light,
        /// Transform of the owning object.
        transform: &'a Transform,
    },
    /// A medium.
    Medium(&'a Medium),
    /// A duplication system.
    Duplication(&'a DuplicationSystem),
}
