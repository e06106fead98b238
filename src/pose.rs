use crate::skeleton::Skeleton;
use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Dot product above which two rotations are treated as parallel and blended with a normalized lerp.
const SLERP_LINEAR_THRESHOLD: f32 = 0.9995;

/// Local-space transform of a single bone.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self { translation: Vec3::ZERO, rotation: Quat::IDENTITY, scale: Vec3::ONE };

    pub fn new(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self { translation, rotation, scale }
    }

    pub fn from_translation(translation: Vec3) -> Self {
        Self { translation, ..Self::IDENTITY }
    }

    pub fn lerp(&self, other: &Transform, t: f32) -> Transform {
        Transform {
            translation: self.translation.lerp(other.translation, t),
            rotation: slerp_shortest(self.rotation, other.rotation, t),
            scale: self.scale.lerp(other.scale, t),
        }
    }

    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

/// Spherical interpolation along the shortest arc between two rotations.
///
/// `b` is negated when the rotations lie in opposite hemispheres so the result never takes the long way
/// around. The output is always normalized.
pub fn slerp_shortest(a: Quat, b: Quat, t: f32) -> Quat {
    let mut dot = a.dot(b);
    let mut end = b;
    if dot < 0.0 {
        end = -b;
        dot = -dot;
    }

    if dot > SLERP_LINEAR_THRESHOLD {
        let blended = Quat::from_xyzw(
            a.x + (end.x - a.x) * t,
            a.y + (end.y - a.y) * t,
            a.z + (end.z - a.z) * t,
            a.w + (end.w - a.w) * t,
        );
        return normalize_or_identity(blended);
    }

    let theta = dot.clamp(-1.0, 1.0).acos();
    let sin_theta = theta.sin();
    let wa = ((1.0 - t) * theta).sin() / sin_theta;
    let wb = (t * theta).sin() / sin_theta;
    normalize_or_identity(Quat::from_xyzw(
        a.x * wa + end.x * wb,
        a.y * wa + end.y * wb,
        a.z * wa + end.z * wb,
        a.w * wa + end.w * wb,
    ))
}

fn normalize_or_identity(quat: Quat) -> Quat {
    if quat.length_squared() > 0.0 {
        quat.normalize()
    } else {
        Quat::IDENTITY
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Pose {
    transforms: Vec<Transform>,
}

impl Pose {
    pub fn new(transforms: Vec<Transform>) -> Self {
        Self { transforms }
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    pub fn get(&self, bone: usize) -> Option<&Transform> {
        self.transforms.get(bone)
    }

    pub fn get_mut(&mut self, bone: usize) -> Option<&mut Transform> {
        self.transforms.get_mut(bone)
    }

    pub fn transforms(&self) -> &[Transform] {
        &self.transforms
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transform> {
        self.transforms.iter()
    }

    pub fn copy_from(&mut self, source: &Pose) {
        self.transforms.clear();
        self.transforms.extend_from_slice(&source.transforms);
    }

    pub(crate) fn reset_to(&mut self, transforms: impl IntoIterator<Item = Transform>) {
        self.transforms.clear();
        self.transforms.extend(transforms);
    }

    /// Blend from `a` toward `b` with `t` clamped to `[0, 1]`; the endpoints return exact copies.
    pub fn blend(a: &Pose, b: &Pose, t: f32) -> Pose {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        if t <= 0.0 {
            return a.clone();
        }
        if t >= 1.0 {
            return b.clone();
        }
        let shared = a.len().min(b.len());
        let longer = if a.len() >= b.len() { a } else { b };
        let mut transforms = Vec::with_capacity(longer.len());
        for (from, to) in a.transforms.iter().zip(b.transforms.iter()) {
            transforms.push(from.lerp(to, t));
        }
        transforms.extend_from_slice(&longer.transforms[shared..]);
        Pose { transforms }
    }

    /// Weighted N-way accumulation of poses.
    ///
    /// Rotations are flipped into the hemisphere of the first contributor before summing, then the sums
    /// are renormalized by the total weight. Bones missing from a contributor fall back to `bind` for that
    /// contributor. A non-positive total weight yields `bind`.
    pub fn accumulate(weighted: &[(&Pose, f32)], bind: &Pose) -> Pose {
        let total: f32 = weighted.iter().map(|(_, weight)| weight.max(0.0)).sum();
        if total <= 0.0 || !total.is_finite() {
            return bind.clone();
        }

        let bone_count = weighted.iter().map(|(pose, _)| pose.len()).fold(bind.len(), usize::max);
        let mut transforms = Vec::with_capacity(bone_count);
        for bone in 0..bone_count {
            let fallback = bind.get(bone).copied().unwrap_or(Transform::IDENTITY);
            let mut translation = Vec3::ZERO;
            let mut scale = Vec3::ZERO;
            let mut rotation = glam::Vec4::ZERO;
            let mut reference: Option<Quat> = None;
            for (pose, weight) in weighted {
                let weight = weight.max(0.0) / total;
                if weight <= 0.0 {
                    continue;
                }
                let sample = pose.get(bone).copied().unwrap_or(fallback);
                translation += sample.translation * weight;
                scale += sample.scale * weight;
                let reference = *reference.get_or_insert(sample.rotation);
                let aligned = if reference.dot(sample.rotation) < 0.0 { -sample.rotation } else { sample.rotation };
                rotation += glam::Vec4::from(aligned) * weight;
            }
            transforms.push(Transform {
                translation,
                rotation: normalize_or_identity(Quat::from_vec4(rotation)),
                scale,
            });
        }
        Pose { transforms }
    }

    pub fn model_matrices(&self, skeleton: &Skeleton) -> Vec<Mat4> {
        let mut model: Vec<Mat4> = Vec::with_capacity(self.len());
        for (index, transform) in self.transforms.iter().enumerate() {
            let local = transform.to_matrix();
            let parent = skeleton.bones().get(index).and_then(|bone| bone.parent).filter(|&parent| parent < index);
            let world = match parent {
                Some(parent) => model[parent] * local,
                None => local,
            };
            model.push(world);
        }
        model
    }
}

impl From<Vec<Transform>> for Pose {
    fn from(transforms: Vec<Transform>) -> Self {
        Self { transforms }
    }
}

impl std::ops::Index<usize> for Pose {
    type Output = Transform;

    fn index(&self, bone: usize) -> &Self::Output {
        &self.transforms[bone]
    }
}
