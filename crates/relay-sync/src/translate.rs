// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Translator seam: per-kind, per-variant conversion into properties.
//!
//! The exporter core never branches on material or texture models. Each
//! element carries a variant tag; the [`TranslatorRegistry`] maps
//! `(kind, variant)` to a [`Translator`] and falls back to the kind's
//! built-in passthrough translator for unknown variants.

use core::fmt;
use std::sync::Arc;

use relay_props::PropertySet;
use relay_scene_port::{ElementKind, ElementRef};
use rustc_hash::FxHashMap;

use crate::builtin;
use crate::context::ConvertContext;
use crate::error::ConvertError;

/// Converts one element into the properties it owns.
///
/// Implementations resolve dependencies (textures, media, nested materials)
/// through the context, which converts each dependency at most once per pass
/// and returns its renderer-side name.
pub trait Translator: Send + Sync {
    /// Produce the properties for `element`, named `name` on the renderer side.
    fn translate(
        &self,
        element: ElementRef<'_>,
        name: &str,
        ctx: &mut ConvertContext<'_>,
    ) -> Result<PropertySet, ConvertError>;
}

/// Live converter stored in an [`ExporterRecord`](crate::ExporterRecord).
#[derive(Clone)]
pub struct Converter {
    kind: ElementKind,
    variant: String,
    generated_name: String,
    translator: Arc<dyn Translator>,
}

impl Converter {
    /// Run the translator for `element`.
    pub fn convert(
        &self,
        element: ElementRef<'_>,
        ctx: &mut ConvertContext<'_>,
    ) -> Result<PropertySet, ConvertError> {
        self.translator.translate(element, &self.generated_name, ctx)
    }

    /// Renderer-side name.
    pub fn generated_name(&self) -> &str {
        &self.generated_name
    }

    /// Element kind.
    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    /// Variant tag the translator was selected by.
    pub fn variant(&self) -> &str {
        &self.variant
    }
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Converter")
            .field("kind", &self.kind)
            .field("variant", &self.variant)
            .field("generated_name", &self.generated_name)
            .finish_non_exhaustive()
    }
}

/// `(kind, variant)` → translator table.
///
/// Registries hold only `Send + Sync` translators and can be cloned into
/// independent sessions.
#[derive(Clone)]
pub struct TranslatorRegistry {
    variants: FxHashMap<(ElementKind, String), Arc<dyn Translator>>,
    defaults: FxHashMap<ElementKind, Arc<dyn Translator>>,
}

impl Default for TranslatorRegistry {
    fn default() -> Self {
        let mut defaults: FxHashMap<ElementKind, Arc<dyn Translator>> = FxHashMap::default();
        defaults.insert(ElementKind::Camera, Arc::new(builtin::CameraTranslator));
        defaults.insert(ElementKind::Object, Arc::new(builtin::ObjectTranslator));
        defaults.insert(ElementKind::Mesh, Arc::new(builtin::ShapeTranslator));
        defaults.insert(ElementKind::Material, Arc::new(builtin::MaterialTranslator));
        defaults.insert(ElementKind::Texture, Arc::new(builtin::TextureTranslator));
        defaults.insert(ElementKind::Light, Arc::new(builtin::LightTranslator));
        defaults.insert(ElementKind::Medium, Arc::new(builtin::VolumeTranslator));
        defaults.insert(
            ElementKind::Duplication,
            Arc::new(builtin::DuplicationTranslator),
        );
        Self {
            variants: FxHashMap::default(),
            defaults,
        }
    }
}

impl TranslatorRegistry {
    /// Registry holding the built-in translators only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `translator` for elements of `kind` tagged `variant`.
    pub fn register(
        &mut self,
        kind: ElementKind,
        variant: impl Into<String>,
        translator: Arc<dyn Translator>,
    ) -> &mut Self {
        self.variants.insert((kind, variant.into()), translator);
        self
    }

    /// Replace the fallback translator for `kind`.
    pub fn set_default(&mut self, kind: ElementKind, translator: Arc<dyn Translator>) -> &mut Self {
        self.defaults.insert(kind, translator);
        self
    }

    /// Build the live converter for an element.
    pub fn converter(&self, kind: ElementKind, variant: &str, generated_name: String) -> Converter {
        let translator = self
            .variants
            .get(&(kind, variant.to_owned()))
            .or_else(|| self.defaults.get(&kind))
            .cloned()
            .unwrap_or_else(|| Arc::new(builtin::EmptyTranslator));
        Converter {
            kind,
            variant: variant.to_owned(),
            generated_name,
            translator,
        }
    }
}

impl fmt::Debug for TranslatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslatorRegistry")
            .field("variants", &self.variants.len())
            .field("defaults", &self.defaults.len())
            .finish()
    }
}

/// Error material colour: impossible to miss in a render.
pub const ERROR_COLOR: [f32; 3] = [1.0, 0.0, 1.0];

/// Minimal safe default substituted when converting `name` failed.
///
/// Every reference another element may hold to `name` still resolves, so the
/// aggregate never has a "deleted but not replaced" gap.
pub fn fallback_properties(kind: ElementKind, name: &str) -> PropertySet {
    let mut props = PropertySet::new();
    match kind {
        ElementKind::Material => {
            props
                .set(format!("scene.materials.{name}.type"), "matte")
                .set(format!("scene.materials.{name}.kd"), ERROR_COLOR);
        }
        ElementKind::Texture => {
            props
                .set(format!("scene.textures.{name}.type"), "constfloat3")
                .set(format!("scene.textures.{name}.value"), ERROR_COLOR);
        }
        ElementKind::Medium => {
            props
                .set(format!("scene.volumes.{name}.type"), "clear")
                .set(format!("scene.volumes.{name}.absorption"), [0.0_f32, 0.0, 0.0]);
        }
        ElementKind::Camera => {
            props
                .set("scene.camera.type", "perspective")
                .set("scene.camera.lookat.orig", [0.0_f32, 0.0, 5.0])
                .set("scene.camera.lookat.target", [0.0_f32, 0.0, 0.0])
                .set("scene.camera.up", [0.0_f32, 1.0, 0.0]);
        }
        // No geometry, no light, no object: absent is the safe default.
        ElementKind::Mesh
        | ElementKind::Light
        | ElementKind::Object
        | ElementKind::Duplication
        | ElementKind::World => {}
    }
    props
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_material_is_well_formed() {
        let props = fallback_properties(ElementKind::Material, "broken");
        assert_eq!(props.get_str("scene.materials.broken.type"), Some("matte"));
        assert_eq!(props.get("scene.materials.broken.kd").map(<[_]>::len), Some(3));
    }

    #[test]
    fn unknown_variant_uses_kind_default() {
        let registry = TranslatorRegistry::default();
        let converter = registry.converter(ElementKind::Texture, "fbm", "noise".to_owned());
        assert_eq!(converter.generated_name(), "noise");
        assert_eq!(converter.variant(), "fbm");
        assert_eq!(converter.kind(), ElementKind::Texture);
    }
}
