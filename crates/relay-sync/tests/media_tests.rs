// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
use relay_app_core::ExportSettings;
use relay_dry_tests::{MockRenderer, SceneBuilder};
use relay_scene_port::{ElementKind, HostData, NeverCancel, Scene};
use relay_sync::{ExportCoordinator, SyncReport, DEFAULT_MEDIUM_KEY};

fn run(host: &HostData) -> (ExportCoordinator, MockRenderer, SyncReport) {
    let mut coordinator = ExportCoordinator::new(ExportSettings::default());
    let mut renderer = MockRenderer::new();
    let report = coordinator
        .sync(host, &mut NeverCancel, &mut renderer)
        .expect("sync");
    (coordinator, renderer, report)
}

fn foggy() -> SceneBuilder {
    SceneBuilder::new("foggy")
        .medium("Fog", "homogeneous")
        .medium("Haze", "heterogeneous")
}

#[test]
fn camera_medium_is_the_default_when_in_scene() {
    let host = HostData::new(
        foggy()
            .camera_exterior("Fog")
            .world_exterior("Haze")
            .build(),
    );
    let (_, renderer, _) = run(&host);
    assert_eq!(renderer.scene.get_str(DEFAULT_MEDIUM_KEY), Some("Fog"));
    assert_eq!(renderer.scene.get_str("scene.camera.volume"), Some("Fog"));
}

#[test]
fn world_default_when_camera_medium_is_foreign() {
    let host = HostData::new(
        foggy()
            .camera_exterior("Underwater")
            .world_exterior("Haze")
            .build(),
    );
    let (_, renderer, _) = run(&host);
    assert_eq!(renderer.scene.get_str(DEFAULT_MEDIUM_KEY), Some("Haze"));
    assert!(!renderer.scene.contains("scene.camera.volume"));
}

#[test]
fn no_default_medium_when_nothing_resolves() {
    let host = HostData::new(foggy().world_exterior("Missing").build());
    let (_, renderer, _) = run(&host);
    assert!(!renderer.scene.contains(DEFAULT_MEDIUM_KEY));
    // Unreferenced media are still exported.
    assert_eq!(
        renderer.scene.get_str("scene.volumes.Haze.type"),
        Some("heterogeneous")
    );
}

#[test]
fn media_of_inactive_scenes_are_exported_once() {
    let active = foggy().build();
    let mut other: Scene = SceneBuilder::new("other").medium("Ocean", "homogeneous").build();
    // The same datablock linked into both scenes.
    other
        .media
        .insert("Fog".to_owned(), active.media["Fog"].clone());
    let host = HostData {
        active,
        others: vec![other],
    };

    let (_, renderer, report) = run(&host);
    assert!(renderer.scene.contains("scene.volumes.Ocean.type"));
    assert_eq!(report.stats.converted(ElementKind::Medium), 3);
}

#[test]
fn switching_world_default_updates_one_key() {
    let mut scene = foggy().world_exterior("Fog").build();
    let mut coordinator = ExportCoordinator::new(ExportSettings::default());
    let mut renderer = MockRenderer::new();
    coordinator
        .sync(&HostData::new(scene.clone()), &mut NeverCancel, &mut renderer)
        .expect("sync");

    scene.world.default_exterior = Some("Haze".to_owned());
    let report = coordinator
        .sync(&HostData::new(scene.clone()), &mut NeverCancel, &mut renderer)
        .expect("sync");
    assert_eq!(report.set_keys, 1);
    assert_eq!(renderer.scene.get_str(DEFAULT_MEDIUM_KEY), Some("Haze"));

    scene.world.default_exterior = None;
    let report = coordinator
        .sync(&HostData::new(scene), &mut NeverCancel, &mut renderer)
        .expect("sync");
    assert_eq!(report.deleted_keys, 1);
    assert!(!renderer.scene.contains(DEFAULT_MEDIUM_KEY));
    assert_eq!(&renderer.scene, coordinator.scene_properties());
}

#[test]
fn material_volumes_reference_converted_media() {
    let host = HostData::new(
        foggy()
            .mesh("Glass", 1)
            .material_with("Bottle", |m| {
                m.variant = "glass".to_owned();
                m.interior_medium = Some("Haze".to_owned());
            })
            .mesh_object("Bottle", "Glass", &[Some("Bottle")])
            .build(),
    );
    let (_, renderer, report) = run(&host);
    assert_eq!(
        renderer.scene.get_str("scene.materials.Bottle.volume.interior"),
        Some("Haze")
    );
    // Claimed in the media phase; the material reuses it.
    assert_eq!(report.stats.converted(ElementKind::Medium), 2);
}
