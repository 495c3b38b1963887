// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Built-in translators: one passthrough translator per element kind.
//!
//! Parameters are forwarded as `scene.<section>.<name>.<param>`; references to
//! other elements are resolved through the [`ConvertContext`] so that every
//! dependency is converted (at most once per pass) before its name is used.

use relay_props::{PropValue, PropertySet};
use relay_scene_port::{ElementKind, ElementRef, ObjectKind, Projection};

use crate::context::ConvertContext;
use crate::error::ConvertError;
use crate::translate::Translator;

fn mismatch(kind: ElementKind) -> ConvertError {
    ConvertError::conversion(kind, "translator received a different element kind")
}

fn variant_or<'v>(variant: &'v str, default: &'v str) -> &'v str {
    if variant.is_empty() {
        default
    } else {
        variant
    }
}

/// Copy every parameter of `params` under `prefix`, skipping `skip` matches.
fn forward_params(
    props: &mut PropertySet,
    prefix: &str,
    params: &PropertySet,
    skip: impl Fn(&str) -> bool,
) {
    for (param, values) in params.iter().filter(|(param, _)| !skip(*param)) {
        props.insert_values(format!("{prefix}.{param}"), values.to_vec());
    }
}

/// Returns an empty set. Used for kinds without a registered translator.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyTranslator;

impl Translator for EmptyTranslator {
    fn translate(
        &self,
        _element: ElementRef<'_>,
        _name: &str,
        _ctx: &mut ConvertContext<'_>,
    ) -> Result<PropertySet, ConvertError> {
        Ok(PropertySet::new())
    }
}

/// `scene.camera.*`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CameraTranslator;

impl Translator for CameraTranslator {
    fn translate(
        &self,
        element: ElementRef<'_>,
        _name: &str,
        ctx: &mut ConvertContext<'_>,
    ) -> Result<PropertySet, ConvertError> {
        let ElementRef::Camera(camera) = element else {
            return Err(mismatch(ElementKind::Camera));
        };
        let mut props = PropertySet::new();
        props
            .set("scene.camera.type", camera.projection.variant())
            .set("scene.camera.lookat.orig", camera.position)
            .set("scene.camera.lookat.target", camera.target)
            .set("scene.camera.up", camera.up);

        match camera.projection {
            Projection::Perspective => {
                if !(camera.fov_degrees > 0.0 && camera.fov_degrees < 180.0) {
                    return Err(ConvertError::conversion(
                        ElementKind::Camera,
                        format!("field of view {} out of range", camera.fov_degrees),
                    ));
                }
                props.set("scene.camera.fieldofview", camera.fov_degrees);
            }
            Projection::Orthographic => {
                let settings = ctx.settings();
                let half = f64::from(camera.ortho_scale) / 2.0;
                let aspect =
                    f64::from(settings.film_width) / f64::from(settings.film_height.max(1));
                let window = if aspect >= 1.0 {
                    [-half * aspect, half * aspect, -half, half]
                } else {
                    [-half, half, -half / aspect, half / aspect]
                };
                props.set("scene.camera.screenwindow", window);
            }
        }

        // A camera medium outside the scene's collection is ignored here and
        // handled by the default-medium chain instead.
        if let Some(medium) = camera.exterior_medium.as_deref() {
            if ctx.scene().media.contains_key(medium) {
                props.set("scene.camera.volume", ctx.medium(medium)?);
            }
        }
        Ok(props)
    }
}

/// Top-level objects: mesh instances, light carriers, duplication sources.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectTranslator;

impl Translator for ObjectTranslator {
    fn translate(
        &self,
        element: ElementRef<'_>,
        name: &str,
        ctx: &mut ConvertContext<'_>,
    ) -> Result<PropertySet, ConvertError> {
        let ElementRef::Object(object) = element else {
            return Err(mismatch(ElementKind::Object));
        };
        let mut props = PropertySet::new();

        if !object.visible {
            ctx.retire(ElementKind::Light, &object.block);
            for system in &object.duplications {
                ctx.retire(ElementKind::Duplication, &system.block);
            }
            return Ok(props);
        }

        match &object.kind {
            ObjectKind::Mesh {
                mesh,
                material_slots,
            } => {
                ctx.retire(ElementKind::Light, &object.block);
                let instanced = ctx.settings().use_instancing;
                if let Some(shape) = ctx.mesh(mesh, instanced)? {
                    let slots: Vec<Option<&str>> = if material_slots.is_empty() {
                        vec![None]
                    } else {
                        material_slots.iter().map(Option::as_deref).collect()
                    };
                    for (index, slot) in slots.into_iter().enumerate() {
                        let material = ctx.material_or_default(slot, ElementKind::Object, name);
                        let prefix = if index == 0 {
                            format!("scene.objects.{name}")
                        } else {
                            let slot_name =
                                ctx.sub_name(ElementKind::Object, &format!("{name}_{index}"));
                            format!("scene.objects.{slot_name}")
                        };
                        props
                            .set(format!("{prefix}.shape"), shape.as_str())
                            .set(format!("{prefix}.material"), material)
                            .set(format!("{prefix}.transformation"), object.transform);
                    }
                }
            }
            ObjectKind::Light { light } => {
                ctx.light(object, light)?;
            }
            ObjectKind::Empty => {
                ctx.retire(ElementKind::Light, &object.block);
            }
        }

        for system in &object.duplications {
            ctx.duplication(system);
        }
        Ok(props)
    }
}

/// `scene.shapes.*`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShapeTranslator;

impl Translator for ShapeTranslator {
    fn translate(
        &self,
        element: ElementRef<'_>,
        name: &str,
        _ctx: &mut ConvertContext<'_>,
    ) -> Result<PropertySet, ConvertError> {
        let ElementRef::Mesh { mesh, .. } = element else {
            return Err(mismatch(ElementKind::Mesh));
        };
        let prefix = format!("scene.shapes.{name}");
        let mut props = PropertySet::new();
        props.set(format!("{prefix}.type"), variant_or(&mesh.variant, "mesh"));
        forward_params(&mut props, &prefix, &mesh.params, |_| false);
        Ok(props)
    }
}

/// `scene.materials.*`, plus any implicit textures the material needs.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaterialTranslator;

impl Translator for MaterialTranslator {
    fn translate(
        &self,
        element: ElementRef<'_>,
        name: &str,
        ctx: &mut ConvertContext<'_>,
    ) -> Result<PropertySet, ConvertError> {
        let ElementRef::Material(material) = element else {
            return Err(mismatch(ElementKind::Material));
        };
        let prefix = format!("scene.materials.{name}");
        let mut props = PropertySet::new();
        props.set(format!("{prefix}.type"), variant_or(&material.variant, "matte"));
        forward_params(&mut props, &prefix, &material.params, |channel| {
            material.textures.contains_key(channel)
        });

        for (channel, texture) in &material.textures {
            let mut reference = ctx.texture(texture)?;
            if let Some(values) = material.params.get(channel) {
                // Constant and texture on one channel: multiply them.
                let implicit = ctx.implicit_texture_name(name, channel);
                let tex_prefix = format!("scene.textures.{implicit}");
                props
                    .set(format!("{tex_prefix}.type"), "scale")
                    .set(format!("{tex_prefix}.texture1"), reference.as_str());
                props.insert_values(format!("{tex_prefix}.texture2"), values.to_vec());
                reference = implicit;
            }
            props.set(format!("{prefix}.{channel}"), reference);
        }

        for (slot, operand) in &material.operands {
            let operand = ctx.material(operand)?;
            props.set(format!("{prefix}.{slot}"), operand);
        }

        if let Some(medium) = material.interior_medium.as_deref() {
            props.set(format!("{prefix}.volume.interior"), ctx.medium(medium)?);
        }
        if let Some(medium) = material.exterior_medium.as_deref() {
            props.set(format!("{prefix}.volume.exterior"), ctx.medium(medium)?);
        }

        if material.is_emissive() {
            let group = ctx.light_group(material.light_group.as_deref());
            props.set(format!("{prefix}.emission.id"), group);
        }
        for output in &material.aux_outputs {
            ctx.request_output(*output);
        }
        Ok(props)
    }
}

/// `scene.textures.*`. Inputs are converted recursively.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextureTranslator;

impl Translator for TextureTranslator {
    fn translate(
        &self,
        element: ElementRef<'_>,
        name: &str,
        ctx: &mut ConvertContext<'_>,
    ) -> Result<PropertySet, ConvertError> {
        let ElementRef::Texture(texture) = element else {
            return Err(mismatch(ElementKind::Texture));
        };
        let prefix = format!("scene.textures.{name}");
        let mut props = PropertySet::new();
        props.set(format!("{prefix}.type"), variant_or(&texture.variant, "constfloat3"));
        forward_params(&mut props, &prefix, &texture.params, |param| {
            texture.inputs.contains_key(param)
        });
        for (slot, input) in &texture.inputs {
            let input = ctx.texture(input)?;
            props.set(format!("{prefix}.{slot}"), input);
        }
        Ok(props)
    }
}

/// `scene.lights.*`, placed with the owning object's transform.
#[derive(Debug, Clone, Copy, Default)]
pub struct LightTranslator;

impl Translator for LightTranslator {
    fn translate(
        &self,
        element: ElementRef<'_>,
        name: &str,
        ctx: &mut ConvertContext<'_>,
    ) -> Result<PropertySet, ConvertError> {
        let ElementRef::Light { light, transform } = element else {
            return Err(mismatch(ElementKind::Light));
        };
        let prefix = format!("scene.lights.{name}");
        let mut props = PropertySet::new();
        props.set(format!("{prefix}.type"), variant_or(&light.variant, "point"));
        forward_params(&mut props, &prefix, &light.params, |_| false);
        let group = ctx.light_group(light.light_group.as_deref());
        props
            .set(format!("{prefix}.transformation"), *transform)
            .set(format!("{prefix}.id"), group);
        Ok(props)
    }
}

/// `scene.volumes.*`.
#[derive(Debug, Clone, Copy, Default)]
pub struct VolumeTranslator;

impl Translator for VolumeTranslator {
    fn translate(
        &self,
        element: ElementRef<'_>,
        name: &str,
        _ctx: &mut ConvertContext<'_>,
    ) -> Result<PropertySet, ConvertError> {
        let ElementRef::Medium(medium) = element else {
            return Err(mismatch(ElementKind::Medium));
        };
        let prefix = format!("scene.volumes.{name}");
        let mut props = PropertySet::new();
        props.set(format!("{prefix}.type"), variant_or(&medium.variant, "clear"));
        forward_params(&mut props, &prefix, &medium.params, |_| false);
        Ok(props)
    }
}

/// One renderer object per duplicated instance, all sharing one shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct DuplicationTranslator;

impl Translator for DuplicationTranslator {
    fn translate(
        &self,
        element: ElementRef<'_>,
        name: &str,
        ctx: &mut ConvertContext<'_>,
    ) -> Result<PropertySet, ConvertError> {
        let ElementRef::Duplication(system) = element else {
            return Err(mismatch(ElementKind::Duplication));
        };
        let mut props = PropertySet::new();
        let Some(shape) = ctx.mesh(&system.instance_mesh, true)? else {
            return Ok(props);
        };
        let material =
            ctx.material_or_default(system.material.as_deref(), ElementKind::Duplication, name);
        let shape = PropValue::from(shape);
        let material = PropValue::from(material);
        for (index, transform) in system.transforms.iter().enumerate() {
            let instance = ctx.sub_name(ElementKind::Object, &format!("{name}_{index}"));
            let prefix = format!("scene.objects.{instance}");
            props
                .set(format!("{prefix}.shape"), shape.clone())
                .set(format!("{prefix}.material"), material.clone())
                .set(format!("{prefix}.transformation"), *transform);
        }
        Ok(props)
    }
}
