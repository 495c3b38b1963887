// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
use relay_app_core::ExportSettings;
use relay_dry_tests::{recording_registry, shared_mesh_scene, MockRenderer, SceneBuilder};
use relay_props::PropValue;
use relay_scene_port::{ElementKind, HostData, KeyMode, NeverCancel, PortError};
use relay_sync::{ExportCoordinator, SyncError, SyncPhase, SyncReport};

fn sync(
    coordinator: &mut ExportCoordinator,
    host: &HostData,
    renderer: &mut MockRenderer,
) -> SyncReport {
    coordinator
        .sync(host, &mut NeverCancel, renderer)
        .expect("sync succeeds")
}

fn assert_renderer_matches(coordinator: &ExportCoordinator, renderer: &MockRenderer) {
    assert_eq!(&renderer.scene, coordinator.scene_properties());
    assert_eq!(&coordinator.owned_union(), coordinator.scene_properties());
}

#[test]
fn first_cycle_builds_from_cumulative_view() {
    let host = HostData::new(shared_mesh_scene(3));
    let mut coordinator = ExportCoordinator::new(ExportSettings::default());
    let mut renderer = MockRenderer::new();

    let report = sync(&mut coordinator, &host, &mut renderer);

    assert!(report.cold);
    assert_eq!(report.cycle, 1);
    assert_eq!(renderer.build_count, 1);
    assert_eq!(renderer.update_count, 0);
    assert_eq!(coordinator.phase(), SyncPhase::Flushed);
    assert_renderer_matches(&coordinator, &renderer);

    let scene = &renderer.scene;
    assert_eq!(scene.get_str("scene.camera.type"), Some("perspective"));
    assert_eq!(scene.get_str("scene.shapes.Shared_inst.type"), Some("mesh"));
    assert_eq!(scene.get_str("scene.materials.Grey.type"), Some("matte"));
    for index in 0..3 {
        let prefix = format!("scene.objects.Object_{index}");
        assert_eq!(scene.get_str(&format!("{prefix}.shape")), Some("Shared_inst"));
        assert_eq!(scene.get_str(&format!("{prefix}.material")), Some("Grey"));
        assert_eq!(
            scene.get(&format!("{prefix}.transformation")).map(<[_]>::len),
            Some(16)
        );
    }
    assert_eq!(
        renderer.config.get_str("film.outputs.0.type"),
        Some("RGB_IMAGEPIPELINE")
    );
}

#[test]
fn unchanged_scene_flushes_empty_batch() {
    let host = HostData::new(shared_mesh_scene(3));
    let mut coordinator = ExportCoordinator::new(ExportSettings::default());
    let mut renderer = MockRenderer::new();

    sync(&mut coordinator, &host, &mut renderer);
    let before = coordinator.scene_properties().clone();
    let report = sync(&mut coordinator, &host, &mut renderer);

    assert!(!report.cold);
    assert!(!report.config_changed);
    assert_eq!(report.set_keys, 0);
    assert_eq!(report.deleted_keys, 0);
    assert!(renderer.last_batch().is_some_and(relay_props::PropertyBatch::is_empty));
    assert_eq!(renderer.reconfigure_count, 0);
    assert_eq!(&before, coordinator.scene_properties());
    assert_renderer_matches(&coordinator, &renderer);
}

#[test]
fn removed_parameter_is_deleted_not_left_stale() {
    let mut scene = SceneBuilder::new("stale")
        .mesh("Cube", 1)
        .material_with("Paint", |m| {
            m.variant = "glossy2".to_owned();
            m.params.set("kd", [0.8_f32, 0.1, 0.1]).set("ks", [0.2_f32, 0.2, 0.2]);
        })
        .mesh_object("Cube", "Cube", &[Some("Paint")])
        .build();
    let mut coordinator = ExportCoordinator::new(ExportSettings::default());
    let mut renderer = MockRenderer::new();
    sync(&mut coordinator, &HostData::new(scene.clone()), &mut renderer);
    assert!(renderer.scene.contains("scene.materials.Paint.ks"));

    let paint = scene.materials.get_mut("Paint").expect("material");
    paint.variant = "matte".to_owned();
    paint.params.remove("ks");
    let report = sync(&mut coordinator, &HostData::new(scene), &mut renderer);

    let batch = renderer.last_batch().expect("incremental batch");
    assert!(batch.deleted.contains("scene.materials.Paint.ks"));
    assert_eq!(
        batch.set.get_str("scene.materials.Paint.type"),
        Some("matte")
    );
    // kd did not change and is not resent.
    assert!(!batch.set.contains("scene.materials.Paint.kd"));
    assert_eq!(report.set_keys, 1);
    assert_eq!(report.deleted_keys, 1);
    assert!(!renderer.scene.contains("scene.materials.Paint.ks"));
    assert_renderer_matches(&coordinator, &renderer);
}

#[test]
fn mesh_is_reconverted_only_when_revision_changes() {
    let (registry, log) = recording_registry();
    let mut scene = shared_mesh_scene(4);
    let mut coordinator = ExportCoordinator::with_registry(ExportSettings::default(), registry);
    let mut renderer = MockRenderer::new();

    let first = sync(&mut coordinator, &HostData::new(scene.clone()), &mut renderer);
    assert_eq!(first.stats.converted(ElementKind::Mesh), 1);
    assert_eq!(first.stats.meshes_reused, 3);

    let second = sync(&mut coordinator, &HostData::new(scene.clone()), &mut renderer);
    assert_eq!(second.stats.converted(ElementKind::Mesh), 0);
    assert_eq!(second.stats.meshes_reused, 4);
    assert_eq!(log.calls(ElementKind::Mesh, "Shared_inst"), 1);

    let mesh = scene.meshes.get_mut("Shared").expect("mesh");
    mesh.revision = 2;
    mesh.params.set("subdivision", 2);
    sync(&mut coordinator, &HostData::new(scene), &mut renderer);
    assert_eq!(log.calls(ElementKind::Mesh, "Shared_inst"), 2);
    assert_eq!(
        renderer.scene.first("scene.shapes.Shared_inst.subdivision"),
        Some(&PropValue::Int(2))
    );
    assert_renderer_matches(&coordinator, &renderer);
}

#[test]
fn full_rebuild_reconverts_fresh_meshes_once() {
    let (registry, log) = recording_registry();
    let host = HostData::new(shared_mesh_scene(3));
    let mut coordinator = ExportCoordinator::with_registry(ExportSettings::default(), registry);
    let mut renderer = MockRenderer::new();

    sync(&mut coordinator, &host, &mut renderer);
    coordinator.request_full_rebuild();
    let report = sync(&mut coordinator, &host, &mut renderer);

    assert!(report.cold);
    assert_eq!(renderer.build_count, 2);
    assert_eq!(log.calls(ElementKind::Mesh, "Shared_inst"), 2);
    assert_eq!(report.stats.meshes_reused, 2);

    let after = sync(&mut coordinator, &host, &mut renderer);
    assert!(!after.cold);
    assert_eq!(after.stats.meshes_reused, 3);
}

#[test]
fn resize_reconfigures_without_touching_scene() {
    let host = HostData::new(shared_mesh_scene(1));
    let mut coordinator = ExportCoordinator::new(ExportSettings::preview());
    let mut renderer = MockRenderer::new();
    sync(&mut coordinator, &host, &mut renderer);

    coordinator.set_film_size(640, 480);
    let report = sync(&mut coordinator, &host, &mut renderer);

    assert!(report.config_changed);
    assert_eq!(report.set_keys, 0);
    assert_eq!(renderer.reconfigure_count, 1);
    assert_eq!(
        renderer.config.first("film.width"),
        Some(&PropValue::Int(640))
    );
    assert_eq!(
        coordinator.last_config().map(|c| c.cycle),
        Some(2)
    );
}

#[test]
fn port_failure_forces_cold_rebuild() {
    let mut scene = shared_mesh_scene(2);
    let mut coordinator = ExportCoordinator::new(ExportSettings::default());
    let mut renderer = MockRenderer::new();
    sync(&mut coordinator, &HostData::new(scene.clone()), &mut renderer);

    scene.objects[0].transform[12] = 5.0;
    renderer.fail_next(PortError::Rejected("scene.objects".to_owned()));
    let err = coordinator
        .sync(&HostData::new(scene.clone()), &mut NeverCancel, &mut renderer)
        .unwrap_err();
    assert!(matches!(err, SyncError::Port(PortError::Rejected(_))));
    assert_eq!(coordinator.last_config().map(|c| c.cycle), Some(1));

    let report = sync(&mut coordinator, &HostData::new(scene), &mut renderer);
    assert!(report.cold);
    assert_eq!(renderer.build_count, 2);
    assert_eq!(
        renderer
            .scene
            .get("scene.objects.Object_0.transformation")
            .and_then(|t| t[12].as_f64()),
        Some(5.0)
    );
    assert_renderer_matches(&coordinator, &renderer);
}

#[test]
fn hidden_objects_drop_their_keys() {
    let mut scene = SceneBuilder::new("hide")
        .mesh("Cube", 1)
        .light("Bulb", "point", None)
        .mesh_object("Cube", "Cube", &[])
        .light_object("Lamp", "Bulb")
        .build();
    let mut coordinator = ExportCoordinator::new(ExportSettings::default());
    let mut renderer = MockRenderer::new();
    sync(&mut coordinator, &HostData::new(scene.clone()), &mut renderer);
    assert!(renderer.scene.contains("scene.objects.Cube.shape"));
    assert!(renderer.scene.contains("scene.lights.Lamp.type"));
    assert_eq!(
        renderer.scene.get_str("scene.objects.Cube.material"),
        Some(relay_sync::DEFAULT_MATERIAL_NAME)
    );

    for object in &mut scene.objects {
        object.visible = false;
    }
    let report = sync(&mut coordinator, &HostData::new(scene.clone()), &mut renderer);
    assert_eq!(report.stats.hidden_objects, 2);
    assert!(!renderer.scene.contains("scene.objects.Cube.shape"));
    assert!(!renderer.scene.contains("scene.lights.Lamp.type"));
    // The shape itself stays defined; only instances go away.
    assert!(renderer.scene.contains("scene.shapes.Cube_inst.type"));
    assert_renderer_matches(&coordinator, &renderer);

    for object in &mut scene.objects {
        object.visible = true;
    }
    sync(&mut coordinator, &HostData::new(scene), &mut renderer);
    assert!(renderer.scene.contains("scene.lights.Lamp.type"));
    assert_renderer_matches(&coordinator, &renderer);
}

#[test]
fn duplication_emits_one_object_per_instance() {
    let host = HostData::new(
        SceneBuilder::new("forest")
            .mesh("Leaf", 1)
            .emitter("Tree", "Leaf", 3)
            .build(),
    );
    let mut coordinator = ExportCoordinator::new(ExportSettings::default());
    let mut renderer = MockRenderer::new();
    let report = sync(&mut coordinator, &host, &mut renderer);

    assert_eq!(report.stats.converted(ElementKind::Duplication), 1);
    for index in 0..3 {
        let prefix = format!("scene.objects.Tree_particles_{index}");
        assert_eq!(renderer.scene.get_str(&format!("{prefix}.shape")), Some("Leaf_inst"));
    }
    assert!(!renderer.scene.contains("scene.objects.Tree_particles_3.shape"));
}

#[test]
fn renames_follow_the_key_mode() {
    let scene = shared_mesh_scene(1);
    let mut renamed = scene.clone();
    renamed.objects[0].block.name = "Hero".to_owned();

    // Name keys: the rename is a new element; the old one keeps an entry.
    let mut by_name = ExportCoordinator::new(ExportSettings::default());
    let mut renderer = MockRenderer::new();
    sync(&mut by_name, &HostData::new(scene.clone()), &mut renderer);
    sync(&mut by_name, &HostData::new(renamed.clone()), &mut renderer);
    assert!(renderer.scene.contains("scene.objects.Hero.shape"));
    assert_eq!(by_name.cache(ElementKind::Object).map(relay_sync::ElementCache::len), Some(2));

    // Identity keys: same key, same renderer name, nothing to send.
    let settings = ExportSettings {
        key_mode: KeyMode::Identity,
        ..ExportSettings::default()
    };
    let mut by_id = ExportCoordinator::new(settings);
    let mut renderer = MockRenderer::new();
    sync(&mut by_id, &HostData::new(scene), &mut renderer);
    let report = sync(&mut by_id, &HostData::new(renamed), &mut renderer);
    assert_eq!(report.set_keys + report.deleted_keys, 0);
    assert_eq!(by_id.cache(ElementKind::Object).map(relay_sync::ElementCache::len), Some(1));
    assert!(renderer.scene.keys().any(|k| k.starts_with("scene.objects.obj")));
}
