use animation_controller::{
    AnimationClip, AnimationController, Bone, BoneTrack, ControllerConfig, Keyframe, PlaybackPhase, Skeleton,
    Transform, UpdatePhase,
};
use glam::{Quat, Vec3};
use std::fs;

fn arm() -> Skeleton {
    Skeleton::new(vec![
        Bone::root("root", Transform::from_translation(Vec3::new(0.0, 1.0, 0.0))),
        Bone::child("hand", 0, Transform::from_translation(Vec3::new(0.5, 0.0, 0.0))),
    ])
}

fn raise() -> AnimationClip {
    AnimationClip::new(
        "raise",
        1.0,
        false,
        vec![BoneTrack::new(
            0,
            vec![
                Keyframe::new(0.0, Vec3::ZERO, Quat::IDENTITY, Vec3::ONE),
                Keyframe::new(1.0, Vec3::new(0.0, 2.0, 0.0), Quat::IDENTITY, Vec3::ONE),
            ],
        )],
    )
}

#[test]
fn bind_pose_before_first_update() {
    let controller = AnimationController::new(arm());
    assert_eq!(*controller.bone_transforms(), arm().bind_pose());
    assert_eq!(controller.state(), PlaybackPhase::Stopped);
    assert_eq!(controller.current_clip(), None);
}

#[test]
fn invalid_clips_are_rejected() {
    let mut controller = AnimationController::new(arm());
    assert!(controller.add_clip(AnimationClip::new("zero", 0.0, true, Vec::new())).is_err());
    assert!(controller.add_clip(AnimationClip::new("", 1.0, true, Vec::new())).is_err());
    assert!(!controller.has_clip("zero"));
    assert!(controller.clips().is_empty());
}

#[test]
fn removing_playing_clip_stops_playback() {
    let mut controller = AnimationController::new(arm());
    controller.add_clip(raise()).expect("raise");
    controller.play("raise", 0.0);
    controller.update(0.25);
    controller.add_event("raise", 0.5, "peak");
    assert!(controller.remove_clip("raise").is_some());
    assert!(controller.events().is_empty(), "markers of a removed clip are dropped");
    assert_eq!(controller.state(), PlaybackPhase::Stopped);
    assert_eq!(controller.current_clip(), None);

    controller.update(0.25);
    assert_eq!(*controller.bone_transforms(), arm().bind_pose());
    assert!(controller.remove_clip("raise").is_none());
}

#[test]
fn current_transform_and_model_matrices_track_pose() {
    let mut controller = AnimationController::new(arm());
    controller.add_clip(raise()).expect("raise");
    controller.play("raise", 0.0);
    controller.update(0.5);

    let root = controller.current_transform();
    assert!((root.translation - Vec3::new(0.0, 1.0, 0.0)).length() < 1e-5);

    let matrices = controller.model_matrices();
    assert_eq!(matrices.len(), 2);
    let hand = matrices[1].transform_point3(Vec3::ZERO);
    assert!((hand - Vec3::new(0.5, 1.0, 0.0)).length() < 1e-5);
}

#[test]
fn skeletonless_controller_drives_single_transform() {
    let mut controller = AnimationController::new(Skeleton::new(Vec::new()));
    controller.add_clip(raise()).expect("raise");
    assert_eq!(controller.current_transform(), Transform::IDENTITY);
    controller.play("raise", 0.0);
    controller.update(0.25);
    assert!((controller.current_transform().translation.y - 0.5).abs() < 1e-5);
    assert!(controller.bone_transforms().is_empty());
}

#[test]
fn config_file_seeds_controller() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("controller.json");
    fs::write(&path, r#"{ "speed": 0.5, "looping_override": true, "default_blend_time": 0.1 }"#)
        .expect("write config");

    let config = ControllerConfig::load(&path).expect("load config");
    let mut controller = AnimationController::with_config(arm(), config);
    assert_eq!(controller.speed(), 0.5);
    assert!(controller.is_looping());
    assert_eq!(controller.default_blend_time(), 0.1);

    controller.add_clip(raise()).expect("raise");
    controller.play("raise", 0.0);
    controller.update(2.5);
    assert_eq!(controller.state(), PlaybackPhase::Playing);
    assert!((controller.current_time() - 0.25).abs() < 1e-5);
}

#[test]
fn update_records_phase_timings() {
    let mut controller = AnimationController::new(arm());
    controller.update(0.016);
    controller.update(0.016);
    let timings = controller.timings();
    let phases: Vec<UpdatePhase> = timings.iter().map(|summary| summary.phase).collect();
    assert_eq!(phases, [UpdatePhase::Tick, UpdatePhase::Events, UpdatePhase::Pose], "state machine disabled");
    assert!(timings.iter().all(|summary| summary.samples == 2));
}

#[test]
fn seek_moves_published_pose_on_next_update() {
    let mut controller = AnimationController::new(arm());
    controller.add_clip(raise()).expect("raise");
    controller.play("raise", 0.0);
    controller.seek(0.75);
    controller.update(0.0);
    assert!((controller.current_time() - 0.75).abs() < 1e-6);
    assert!((controller.bone_transforms()[0].translation.y - 1.5).abs() < 1e-5);

    controller.seek(5.0);
    assert_eq!(controller.current_time(), 1.0, "one-shot clips clamp");
}
