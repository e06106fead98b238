use animation_controller::{
    AnimationClip, AnimationController, BlendNode, BlendTree, Bone, BoneTrack, ControllerConfig, Keyframe, Skeleton,
    Transform,
};
use glam::{Vec2, Vec3};

fn locomotion_tree() -> BlendTree {
    let mut tree = BlendTree::new();
    tree.add_node(BlendNode::new("idle", Vec2::new(0.0, 0.0)));
    tree.add_node(BlendNode::new("walk", Vec2::new(1.0, 0.0)));
    tree.add_node(BlendNode::new("run", Vec2::new(2.0, 0.0)));
    tree
}

fn held_clip(name: &str, x: f32) -> AnimationClip {
    AnimationClip::new(
        name,
        1.0,
        true,
        vec![BoneTrack::new(0, vec![Keyframe::at(0.0, Transform::from_translation(Vec3::new(x, 0.0, 0.0)))])],
    )
}

#[test]
fn weights_normalize_at_origin() {
    let mut tree = locomotion_tree();
    tree.set_blend_parameter(0.0, 0.0);
    let sum: f32 = tree.nodes().iter().map(BlendNode::weight).sum();
    assert!((sum - 1.0).abs() < 1e-5);

    let idle = tree.nodes()[0].weight();
    assert!(tree.nodes().iter().all(|node| node.weight() <= idle), "closest node dominates");
    let active = tree.active_clips();
    assert_eq!(active.len(), 1, "walk sits exactly one unit away and contributes nothing");
    assert_eq!(active[0].0, "idle");
}

#[test]
fn origin_node_dominates_square_layout() {
    let mut tree = BlendTree::new();
    tree.add_node(BlendNode::new("idle", Vec2::new(0.0, 0.0)));
    tree.add_node(BlendNode::new("forward", Vec2::new(1.0, 0.0)));
    tree.add_node(BlendNode::new("strafe", Vec2::new(0.0, 1.0)));
    tree.set_blend_parameter(0.0, 0.0);

    let weights: Vec<f32> = tree.nodes().iter().map(BlendNode::weight).collect();
    assert!((weights.iter().sum::<f32>() - 1.0).abs() < 1e-5);
    assert!(weights[0] > weights[1] && weights[0] > weights[2]);
}

#[test]
fn moving_parameter_shifts_weight() {
    let mut tree = locomotion_tree();
    tree.set_blend_parameter(1.25, 0.0);
    let active = tree.active_clips();
    let names: Vec<&str> = active.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, ["walk", "run"]);
    assert!(active[0].1 > active[1].1);
    assert!((active[0].1 + active[1].1 - 1.0).abs() < 1e-5);
}

#[test]
fn empty_tree_has_no_active_clips() {
    let mut tree = BlendTree::new();
    tree.set_blend_parameter(0.3, 0.3);
    assert!(tree.active_clips().is_empty());
}

#[test]
fn controller_pose_follows_blend_weights() {
    let skeleton = Skeleton::new(vec![Bone::root("root", Transform::IDENTITY)]);
    let mut controller =
        AnimationController::with_config(skeleton, ControllerConfig { blend_tree_enabled: true, ..Default::default() });
    controller.add_clip(held_clip("idle", 0.0)).expect("idle");
    controller.add_clip(held_clip("walk", 4.0)).expect("walk");
    controller.add_clip(held_clip("run", 8.0)).expect("run");
    *controller.blend_tree_mut() = locomotion_tree();

    controller.blend_tree_mut().set_blend_parameter(0.5, 0.0);
    controller.update(0.016);
    let x = controller.bone_transforms()[0].translation.x;
    assert!((x - 2.0).abs() < 1e-4, "idle and walk share the pose equally, got {x}");

    controller.enable_blend_tree(false);
    controller.update(0.016);
    assert_eq!(controller.bone_transforms()[0], Transform::IDENTITY, "nothing playing falls back to bind pose");
}

#[test]
fn blend_tree_without_registered_clips_falls_back_to_playback() {
    let skeleton = Skeleton::new(vec![Bone::root("root", Transform::IDENTITY)]);
    let mut controller =
        AnimationController::with_config(skeleton, ControllerConfig { blend_tree_enabled: true, ..Default::default() });
    controller.add_clip(held_clip("pose", 3.0)).expect("pose");
    *controller.blend_tree_mut() = locomotion_tree();
    controller.play("pose", 0.0);
    controller.update(0.1);
    assert!((controller.bone_transforms()[0].translation.x - 3.0).abs() < 1e-5);
}
