use crate::pose::Transform;
use anyhow::{anyhow, bail, Result};
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How the segment leaving a keyframe is evaluated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    #[default]
    Linear,
    /// Hold this keyframe's value until the next keyframe.
    Step,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: f32,
    #[serde(default = "default_position")]
    pub position: Vec3,
    #[serde(default = "default_rotation")]
    pub rotation: Quat,
    #[serde(default = "default_scale")]
    pub scale: Vec3,
    #[serde(default)]
    pub interpolation: Interpolation,
}

fn default_position() -> Vec3 {
    Vec3::ZERO
}

fn default_rotation() -> Quat {
    Quat::IDENTITY
}

fn default_scale() -> Vec3 {
    Vec3::ONE
}

impl Keyframe {
    pub fn new(time: f32, position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self { time, position, rotation, scale, interpolation: Interpolation::Linear }
    }

    pub fn at(time: f32, transform: Transform) -> Self {
        Self::new(time, transform.translation, transform.rotation, transform.scale)
    }

    pub fn stepped(mut self) -> Self {
        self.interpolation = Interpolation::Step;
        self
    }

    pub fn transform(&self) -> Transform {
        Transform { translation: self.position, rotation: self.rotation, scale: self.scale }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoneTrack {
    pub bone_index: usize,
    #[serde(default)]
    pub keyframes: Vec<Keyframe>,
}

impl BoneTrack {
    pub fn new(bone_index: usize, keyframes: Vec<Keyframe>) -> Self {
        Self { bone_index, keyframes }
    }

    /// Builds a track from unordered authoring data.
    ///
    /// Keyframes with a non-finite or negative time are dropped, the rest are sorted and keyframes sharing a
    /// timestamp collapse into the last one written.
    pub fn sorted(bone_index: usize, keyframes: impl IntoIterator<Item = Keyframe>) -> Self {
        let mut frames: Vec<(usize, Keyframe)> = keyframes
            .into_iter()
            .filter(|kf| kf.time.is_finite() && kf.time >= 0.0)
            .enumerate()
            .collect();
        frames.sort_by(|(ia, a), (ib, b)| a.time.total_cmp(&b.time).then(ia.cmp(ib)));

        let mut deduped: Vec<Keyframe> = Vec::with_capacity(frames.len());
        for (_, frame) in frames {
            if let Some(last) = deduped.last_mut() {
                if (frame.time - last.time).abs() <= f32::EPSILON {
                    *last = frame;
                    continue;
                }
            }
            deduped.push(frame);
        }
        Self { bone_index, keyframes: deduped }
    }

    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    pub fn end_time(&self) -> f32 {
        self.keyframes.last().map(|kf| kf.time).unwrap_or(0.0)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnimationClip {
    pub name: String,
    pub duration: f32,
    #[serde(default = "default_looping")]
    pub looping: bool,
    #[serde(default)]
    pub tracks: Vec<BoneTrack>,
}

const fn default_looping() -> bool {
    true
}

impl AnimationClip {
    pub fn new(name: impl Into<String>, duration: f32, looping: bool, tracks: Vec<BoneTrack>) -> Self {
        Self { name: name.into(), duration, looping, tracks }
    }

    pub fn from_tracks(name: impl Into<String>, tracks: Vec<BoneTrack>, looping: bool) -> Self {
        let duration = tracks.iter().map(BoneTrack::end_time).fold(0.0_f32, f32::max);
        Self { name: name.into(), duration, looping, tracks }
    }

    pub fn track_for(&self, bone_index: usize) -> Option<&BoneTrack> {
        self.tracks.iter().find(|track| track.bone_index == bone_index)
    }

    pub fn has_valid_duration(&self) -> bool {
        self.duration.is_finite() && self.duration > 0.0
    }
}

#[derive(Clone, Debug, Default)]
pub struct ClipLibrary {
    clips: HashMap<String, AnimationClip>,
}

impl ClipLibrary {
    pub fn new() -> Self {
        Self { clips: HashMap::new() }
    }

    /// Registers `clip` under its own name, replacing any clip with the same name.
    pub fn insert(&mut self, clip: AnimationClip) -> Result<()> {
        if clip.name.is_empty() {
            return Err(anyhow!("Animation clip name cannot be empty"));
        }
        if !clip.has_valid_duration() {
            bail!("Animation clip '{}' has invalid duration {} (expected > 0)", clip.name, clip.duration);
        }
        self.clips.insert(clip.name.clone(), clip);
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Option<AnimationClip> {
        self.clips.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&AnimationClip> {
        self.clips.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.clips.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.clips.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(time: f32, x: f32) -> Keyframe {
        Keyframe::at(time, Transform::from_translation(Vec3::new(x, 0.0, 0.0)))
    }

    #[test]
    fn sorted_track_orders_and_dedupes() {
        let track = BoneTrack::sorted(0, vec![key(1.0, 1.0), key(0.0, 0.0), key(1.0, 2.0), key(f32::NAN, 9.0)]);
        let times: Vec<f32> = track.keyframes.iter().map(|kf| kf.time).collect();
        assert_eq!(times, vec![0.0, 1.0]);
        assert_eq!(track.keyframes[1].position.x, 2.0, "later duplicate wins");
    }

    #[test]
    fn from_tracks_uses_latest_keyframe() {
        let clip = AnimationClip::from_tracks(
            "wave",
            vec![BoneTrack::new(0, vec![key(0.0, 0.0), key(0.5, 1.0)]), BoneTrack::new(1, vec![key(1.25, 0.0)])],
            false,
        );
        assert_eq!(clip.duration, 1.25);
        assert!(clip.track_for(1).is_some());
        assert!(clip.track_for(2).is_none());
    }

    #[test]
    fn library_rejects_zero_duration() {
        let mut library = ClipLibrary::new();
        let err = library.insert(AnimationClip::new("empty", 0.0, true, Vec::new())).unwrap_err();
        assert!(err.to_string().contains("invalid duration"));
        assert!(library.is_empty());

        library.insert(AnimationClip::new("idle", 1.0, true, Vec::new())).expect("valid clip");
        library.insert(AnimationClip::new("run", 0.8, true, Vec::new())).expect("valid clip");
        assert_eq!(library.names(), vec!["idle".to_string(), "run".to_string()]);
        assert!(library.remove("idle").is_some());
        assert!(!library.contains("idle"));
    }

    #[test]
    fn clip_json_defaults() {
        let clip: AnimationClip = serde_json::from_str(
            r#"{ "name": "nod", "duration": 1.0, "tracks": [ { "bone_index": 0, "keyframes": [ { "time": 0.0 }, { "time": 0.5, "interpolation": "step" } ] } ] }"#,
        )
        .expect("parse clip");
        assert!(clip.looping);
        assert_eq!(clip.tracks[0].keyframes[0].interpolation, Interpolation::Linear);
        assert_eq!(clip.tracks[0].keyframes[1].interpolation, Interpolation::Step);
        assert_eq!(clip.tracks[0].keyframes[0].rotation, Quat::IDENTITY);
        assert_eq!(clip.tracks[0].keyframes[0].scale, Vec3::ONE);
    }
}
