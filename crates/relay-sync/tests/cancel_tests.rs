// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
use relay_app_core::ExportSettings;
use relay_dry_tests::{cancel_after, shared_mesh_scene, MockRenderer};
use relay_scene_port::{CancelFlag, ElementKind, HostData, NeverCancel};
use relay_sync::{ExportCoordinator, SyncError, SyncPhase};

#[test]
fn cancel_mid_walk_keeps_last_config() {
    let mut scene = shared_mesh_scene(10);
    let mut coordinator = ExportCoordinator::new(ExportSettings::default());
    let mut renderer = MockRenderer::new();
    coordinator
        .sync(&HostData::new(scene.clone()), &mut NeverCancel, &mut renderer)
        .expect("first sync");
    let flushed = coordinator.last_config().cloned().expect("flushed config");

    for object in &mut scene.objects {
        object.transform[13] = 1.0;
    }
    let err = coordinator
        .sync(&HostData::new(scene.clone()), &mut cancel_after(4), &mut renderer)
        .unwrap_err();

    assert_eq!(err, SyncError::Cancelled { index: 4 });
    assert_eq!(coordinator.phase(), SyncPhase::Flushed);
    assert_eq!(coordinator.last_config(), Some(&flushed));
    assert_eq!(renderer.update_count, 0);
    assert_eq!(renderer.scene, flushed.scene);
    // Objects 0..4 were reconverted; their changes wait for the next flush.
    assert!(coordinator.aggregator().has_pending());

    let report = coordinator
        .sync(&HostData::new(scene), &mut NeverCancel, &mut renderer)
        .expect("resumed sync");
    assert!(!report.cold);
    assert_eq!(report.stats.converted(ElementKind::Object), 10);
    // Every moved object reaches the renderer exactly once.
    assert_eq!(renderer.update_count, 1);
    for index in 0..10 {
        let transform = renderer
            .scene
            .get(&format!("scene.objects.Object_{index}.transformation"))
            .expect("transform");
        assert_eq!(transform[13].as_f64(), Some(1.0));
    }
    assert_eq!(&renderer.scene, coordinator.scene_properties());
}

#[test]
fn cancel_before_first_flush_returns_to_init() {
    let host = HostData::new(shared_mesh_scene(3));
    let mut coordinator = ExportCoordinator::new(ExportSettings::default());
    let mut renderer = MockRenderer::new();
    let flag = CancelFlag::new();
    flag.cancel();

    let err = coordinator
        .sync(&host, &mut flag.clone(), &mut renderer)
        .unwrap_err();
    assert_eq!(err, SyncError::Cancelled { index: 0 });
    assert_eq!(coordinator.phase(), SyncPhase::Init);
    assert!(coordinator.last_config().is_none());
    assert!(!renderer.is_built());

    flag.reset();
    let report = coordinator
        .sync(&host, &mut flag.clone(), &mut renderer)
        .expect("sync after reset");
    assert!(report.cold);
    assert_eq!(renderer.build_count, 1);
    assert_eq!(&renderer.scene, coordinator.scene_properties());
}

#[test]
fn cancelled_pass_does_not_leak_dedup_claims() {
    let host = HostData::new(shared_mesh_scene(6));
    let mut coordinator = ExportCoordinator::new(ExportSettings::default());
    let mut renderer = MockRenderer::new();

    coordinator
        .sync(&host, &mut cancel_after(2), &mut renderer)
        .unwrap_err();
    let report = coordinator
        .sync(&host, &mut NeverCancel, &mut renderer)
        .expect("sync");

    // The shared material was claimed by the cancelled pass; it must be
    // claimable (and converted) again.
    assert_eq!(report.stats.converted(ElementKind::Material), 1);
    assert!(renderer.scene.contains("scene.materials.Grey.type"));
}
