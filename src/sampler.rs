//! Keyframe evaluation for clips and tracks.

use crate::clip::{AnimationClip, BoneTrack, Interpolation};
use crate::pose::{slerp_shortest, Pose, Transform};
use crate::skeleton::Skeleton;

/// Samples one track at `time`.
///
/// Times outside the keyframe range clamp to the first or last keyframe. Returns `None` for an empty
/// track so callers can substitute the bind pose.
pub fn sample_track(track: &BoneTrack, time: f32) -> Option<Transform> {
    let keyframes = track.keyframes.as_slice();
    let first = keyframes.first()?;
    let last = keyframes.last()?;

    if time.is_nan() || time <= first.time {
        return Some(first.transform());
    }
    if time >= last.time {
        return Some(last.transform());
    }

    // First keyframe strictly after `time`; always in 1..len here.
    let next_index = keyframes.partition_point(|kf| kf.time <= time);
    let prev = &keyframes[next_index - 1];
    let next = &keyframes[next_index];

    let span = next.time - prev.time;
    if span <= 0.0 || prev.interpolation == Interpolation::Step {
        return Some(prev.transform());
    }
    let t = ((time - prev.time) / span).clamp(0.0, 1.0);
    Some(Transform {
        translation: prev.position.lerp(next.position, t),
        rotation: slerp_shortest(prev.rotation, next.rotation, t),
        scale: prev.scale.lerp(next.scale, t),
    })
}

pub fn sample_clip(clip: &AnimationClip, skeleton: &Skeleton, time: f32) -> Pose {
    let mut pose = Pose::default();
    sample_clip_into(clip, skeleton, time, &mut pose);
    pose
}

/// Same as [`sample_clip`] but writes into `out`, reusing its allocation.
pub fn sample_clip_into(clip: &AnimationClip, skeleton: &Skeleton, time: f32, out: &mut Pose) {
    out.reset_to(skeleton.bones().iter().map(|bone| bone.bind));
    for track in &clip.tracks {
        let Some(slot) = out.get_mut(track.bone_index) else {
            continue;
        };
        if let Some(sample) = sample_track(track, time) {
            *slot = sample;
        }
    }
    crate::profiler::record_sample();
}

pub fn sample_root(clip: &AnimationClip, skeleton: &Skeleton, time: f32) -> Transform {
    match clip.tracks.first() {
        Some(track) => {
            sample_track(track, time).unwrap_or_else(|| skeleton.bind_transform(track.bone_index))
        }
        None => skeleton.bind_transform(0),
    }
}
