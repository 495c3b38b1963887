// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Host scene builders.

use relay_scene_port::{
    Camera, Datablock, DuplicationSystem, Light, Material, Medium, MeshData, Object, ObjectKind,
    Scene, Texture, Transform, IDENTITY,
};

/// Builder for [`Scene`] fixtures.
///
/// Every element gets a fresh host id in insertion order, so the same builder
/// calls always produce the same identities.
///
/// # Example
///
/// ```
/// use relay_dry_tests::SceneBuilder;
///
/// let scene = SceneBuilder::new("shot")
///     .mesh("Cube", 1)
///     .material("Red", "matte")
///     .mesh_object("Cube.001", "Cube", &[Some("Red")])
///     .build();
/// assert_eq!(scene.objects.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct SceneBuilder {
    scene: Scene,
    next_id: u64,
}

impl SceneBuilder {
    /// Empty scene with a default camera.
    pub fn new(name: &str) -> Self {
        Self {
            scene: Scene {
                name: name.to_owned(),
                camera: Some(Camera::default()),
                ..Scene::default()
            },
            next_id: 100,
        }
    }

    fn block(&mut self, name: &str) -> Datablock {
        self.next_id += 1;
        Datablock::new(self.next_id, name)
    }

    /// Replace the camera (`None` removes it).
    pub fn camera(mut self, camera: Option<Camera>) -> Self {
        self.scene.camera = camera;
        self
    }

    /// Add mesh data at `revision`.
    pub fn mesh(mut self, name: &str, revision: u64) -> Self {
        let mesh = MeshData {
            block: self.block(name),
            revision,
            variant: "mesh".to_owned(),
            ..MeshData::default()
        };
        self.scene.meshes.insert(name.to_owned(), mesh);
        self
    }

    /// Add a material of model `variant`.
    pub fn material(self, name: &str, variant: &str) -> Self {
        self.material_with(name, |m| m.variant = variant.to_owned())
    }

    /// Add a material and let `edit` fill it in.
    pub fn material_with(mut self, name: &str, edit: impl FnOnce(&mut Material)) -> Self {
        let mut material = Material {
            block: self.block(name),
            variant: "matte".to_owned(),
            ..Material::default()
        };
        edit(&mut material);
        self.scene.materials.insert(name.to_owned(), material);
        self
    }

    /// Add a texture of type `variant` fed by `inputs` (`slot`, texture name).
    pub fn texture(mut self, name: &str, variant: &str, inputs: &[(&str, &str)]) -> Self {
        let texture = Texture {
            block: self.block(name),
            variant: variant.to_owned(),
            inputs: inputs
                .iter()
                .map(|(slot, input)| ((*slot).to_owned(), (*input).to_owned()))
                .collect(),
            ..Texture::default()
        };
        self.scene.textures.insert(name.to_owned(), texture);
        self
    }

    /// Add a medium to the scene's collection.
    pub fn medium(mut self, name: &str, variant: &str) -> Self {
        let medium = Medium {
            block: self.block(name),
            variant: variant.to_owned(),
            ..Medium::default()
        };
        self.scene.media.insert(name.to_owned(), medium);
        self
    }

    /// Add a light datablock in light group `group`.
    pub fn light(mut self, name: &str, variant: &str, group: Option<&str>) -> Self {
        let light = Light {
            block: self.block(name),
            variant: variant.to_owned(),
            light_group: group.map(str::to_owned),
            ..Light::default()
        };
        self.scene.lights.insert(name.to_owned(), light);
        self
    }

    /// Add a visible mesh object.
    pub fn mesh_object(mut self, name: &str, mesh: &str, slots: &[Option<&str>]) -> Self {
        let object = Object {
            block: self.block(name),
            kind: ObjectKind::Mesh {
                mesh: mesh.to_owned(),
                material_slots: slots.iter().map(|s| s.map(str::to_owned)).collect(),
            },
            transform: IDENTITY,
            visible: true,
            duplications: Vec::new(),
        };
        self.scene.objects.push(object);
        self
    }

    /// Add a visible object carrying light `light`.
    pub fn light_object(mut self, name: &str, light: &str) -> Self {
        let object = Object {
            block: self.block(name),
            kind: ObjectKind::Light {
                light: light.to_owned(),
            },
            transform: IDENTITY,
            visible: true,
            duplications: Vec::new(),
        };
        self.scene.objects.push(object);
        self
    }

    /// Add an empty emitting `count` instances of `mesh`.
    pub fn emitter(mut self, name: &str, mesh: &str, count: usize) -> Self {
        let system = DuplicationSystem {
            block: self.block(&format!("{name}_particles")),
            instance_mesh: mesh.to_owned(),
            material: None,
            transforms: (0..count).map(offset).collect(),
        };
        let object = Object {
            block: self.block(name),
            kind: ObjectKind::Empty,
            transform: IDENTITY,
            visible: true,
            duplications: vec![system],
        };
        self.scene.objects.push(object);
        self
    }

    /// Set the world's default exterior medium.
    pub fn world_exterior(mut self, medium: &str) -> Self {
        self.scene.world.default_exterior = Some(medium.to_owned());
        self
    }

    /// Set the camera's exterior medium.
    pub fn camera_exterior(mut self, medium: &str) -> Self {
        let mut camera = self.scene.camera.take().unwrap_or_default();
        camera.exterior_medium = Some(medium.to_owned());
        self.scene.camera = Some(camera);
        self
    }

    /// Finish.
    pub fn build(self) -> Scene {
        self.scene
    }
}

/// Identity transform translated `index` units along X.
pub fn offset(index: usize) -> Transform {
    let mut transform = IDENTITY;
    transform[12] = index as f32;
    transform
}

/// `count` mesh objects `Object_0..` sharing mesh `Shared` and material `Grey`.
pub fn shared_mesh_scene(count: usize) -> Scene {
    let mut builder = SceneBuilder::new("shared")
        .mesh("Shared", 1)
        .material_with("Grey", |m| {
            m.params.set("kd", [0.5_f32, 0.5, 0.5]);
        });
    for index in 0..count {
        builder = builder.mesh_object(&format!("Object_{index}"), "Shared", &[Some("Grey")]);
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_deterministic() {
        let a = shared_mesh_scene(3);
        let b = shared_mesh_scene(3);
        assert_eq!(a, b);
        assert_ne!(a.objects[0].block.id, a.objects[1].block.id);
    }

    #[test]
    fn emitter_spreads_instances() {
        let scene = SceneBuilder::new("e").mesh("Leaf", 1).emitter("Tree", "Leaf", 4).build();
        let transforms = &scene.objects[0].duplications[0].transforms;
        assert_eq!(transforms.len(), 4);
        assert!((transforms[3][12] - 3.0).abs() < f32::EPSILON);
    }
}
