// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Translator doubles: call recording, forced failures, scripted output.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use relay_props::PropertySet;
use relay_scene_port::{ElementKind, ElementRef};
use relay_sync::{
    CameraTranslator, ConvertContext, ConvertError, DuplicationTranslator, LightTranslator,
    MaterialTranslator, ObjectTranslator, ShapeTranslator, TextureTranslator, Translator,
    TranslatorRegistry, VolumeTranslator,
};

/// Shared count of translator invocations per `(kind, generated name)`.
#[derive(Clone, Debug, Default)]
pub struct CallLog {
    calls: Arc<Mutex<BTreeMap<(ElementKind, String), usize>>>,
}

impl CallLog {
    fn lock(&self) -> MutexGuard<'_, BTreeMap<(ElementKind, String), usize>> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, kind: ElementKind, name: &str) {
        *self.lock().entry((kind, name.to_owned())).or_default() += 1;
    }

    /// Times the element `name` of `kind` was translated.
    pub fn calls(&self, kind: ElementKind, name: &str) -> usize {
        self.lock()
            .get(&(kind, name.to_owned()))
            .copied()
            .unwrap_or(0)
    }

    /// Translations of any element of `kind`.
    pub fn calls_of(&self, kind: ElementKind) -> usize {
        self.lock()
            .iter()
            .filter(|((k, _), _)| *k == kind)
            .map(|(_, n)| n)
            .sum()
    }

    /// Forget every call.
    pub fn reset(&self) {
        self.lock().clear();
    }
}

/// Forwards to an inner translator and logs the call.
pub struct RecordingTranslator {
    kind: ElementKind,
    inner: Arc<dyn Translator>,
    log: CallLog,
}

impl RecordingTranslator {
    /// Wrap `inner`, logging under `kind`.
    pub fn new(kind: ElementKind, inner: Arc<dyn Translator>, log: CallLog) -> Self {
        Self { kind, inner, log }
    }
}

impl Translator for RecordingTranslator {
    fn translate(
        &self,
        element: ElementRef<'_>,
        name: &str,
        ctx: &mut ConvertContext<'_>,
    ) -> Result<PropertySet, ConvertError> {
        self.log.record(self.kind, name);
        self.inner.translate(element, name, ctx)
    }
}

/// Built-in registry with every default translator wrapped in a
/// [`RecordingTranslator`] sharing the returned log.
pub fn recording_registry() -> (TranslatorRegistry, CallLog) {
    let log = CallLog::default();
    let builtins: [(ElementKind, Arc<dyn Translator>); 8] = [
        (ElementKind::Camera, Arc::new(CameraTranslator)),
        (ElementKind::Object, Arc::new(ObjectTranslator)),
        (ElementKind::Mesh, Arc::new(ShapeTranslator)),
        (ElementKind::Material, Arc::new(MaterialTranslator)),
        (ElementKind::Texture, Arc::new(TextureTranslator)),
        (ElementKind::Light, Arc::new(LightTranslator)),
        (ElementKind::Medium, Arc::new(VolumeTranslator)),
        (ElementKind::Duplication, Arc::new(DuplicationTranslator)),
    ];
    let mut registry = TranslatorRegistry::new();
    for (kind, inner) in builtins {
        registry.set_default(
            kind,
            Arc::new(RecordingTranslator::new(kind, inner, log.clone())),
        );
    }
    (registry, log)
}

/// Always fails with a conversion error.
#[derive(Debug, Clone)]
pub struct FailingTranslator {
    kind: ElementKind,
    reason: String,
}

impl FailingTranslator {
    /// Fail every element of `kind` with `reason`.
    pub fn new(kind: ElementKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }
}

impl Translator for FailingTranslator {
    fn translate(
        &self,
        _element: ElementRef<'_>,
        _name: &str,
        _ctx: &mut ConvertContext<'_>,
    ) -> Result<PropertySet, ConvertError> {
        Err(ConvertError::conversion(self.kind, self.reason.clone()))
    }
}

/// Returns whatever the test scripted for each generated name (empty when
/// nothing was scripted). Clones share the script.
#[derive(Clone, Debug, Default)]
pub struct ScriptedTranslator {
    script: Arc<Mutex<BTreeMap<String, PropertySet>>>,
}

impl ScriptedTranslator {
    /// Empty script.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, PropertySet>> {
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Script the output for `name` from the next translation on.
    pub fn set(&self, name: &str, properties: PropertySet) {
        self.lock().insert(name.to_owned(), properties);
    }

    /// Drop the script for `name` (it translates to nothing).
    pub fn clear(&self, name: &str) {
        self.lock().remove(name);
    }
}

impl Translator for ScriptedTranslator {
    fn translate(
        &self,
        _element: ElementRef<'_>,
        name: &str,
        _ctx: &mut ConvertContext<'_>,
    ) -> Result<PropertySet, ConvertError> {
        Ok(self.lock().get(name).cloned().unwrap_or_default())
    }
}

/// Cancellation poll that fires on poll number `n` (0-based): objects
/// `0..n` are converted, then the cycle stops.
pub fn cancel_after(n: usize) -> impl FnMut() -> bool {
    let mut polls = 0_usize;
    move || {
        let fire = polls >= n;
        polls += 1;
        fire
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_after_fires_from_nth_poll() {
        let mut poll = cancel_after(2);
        assert_eq!((0..4).map(|_| poll()).collect::<Vec<_>>(), vec![false, false, true, true]);
    }

    #[test]
    fn call_log_is_shared_between_clones() {
        let log = CallLog::default();
        let other = log.clone();
        log.record(ElementKind::Mesh, "Cube");
        log.record(ElementKind::Mesh, "Cube");
        log.record(ElementKind::Mesh, "Sphere");
        assert_eq!(other.calls(ElementKind::Mesh, "Cube"), 2);
        assert_eq!(other.calls_of(ElementKind::Mesh), 3);
        other.reset();
        assert_eq!(log.calls_of(ElementKind::Mesh), 0);
    }
}
