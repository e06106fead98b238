use crate::pose::{Pose, Transform};
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bone {
    pub name: Arc<str>,
    /// Index of the parent bone; `None` marks a root.
    #[serde(default)]
    pub parent: Option<usize>,
    #[serde(default)]
    pub bind: Transform,
}

impl Bone {
    pub fn root(name: impl Into<Arc<str>>, bind: Transform) -> Self {
        Self { name: name.into(), parent: None, bind }
    }

    pub fn child(name: impl Into<Arc<str>>, parent: usize, bind: Transform) -> Self {
        Self { name: name.into(), parent: Some(parent), bind }
    }
}

/// Ordered bone list supplied by the asset pipeline. Immutable once handed to a controller.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Skeleton {
    bones: Arc<[Bone]>,
}

impl Skeleton {
    pub fn new(bones: Vec<Bone>) -> Self {
        Self { bones: Arc::from(bones.into_boxed_slice()) }
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn bone_index(&self, name: &str) -> Option<usize> {
        self.bones.iter().position(|bone| bone.name.as_ref() == name)
    }

    pub fn roots(&self) -> Vec<usize> {
        self.bones
            .iter()
            .enumerate()
            .filter(|(_, bone)| bone.parent.is_none())
            .map(|(index, _)| index)
            .collect()
    }

    pub fn bind_pose(&self) -> Pose {
        Pose::new(self.bones.iter().map(|bone| bone.bind).collect())
    }

    pub(crate) fn bind_transform(&self, bone: usize) -> Transform {
        self.bones.get(bone).map(|bone| bone.bind).unwrap_or(Transform::IDENTITY)
    }

    pub fn validate(&self) -> Result<()> {
        for (index, bone) in self.bones.iter().enumerate() {
            if let Some(parent) = bone.parent {
                if parent >= self.bones.len() {
                    bail!("Bone '{}' references missing parent index {parent}", bone.name);
                }
                if parent >= index {
                    bail!("Bone '{}' (index {index}) must come after its parent (index {parent})", bone.name);
                }
            }
        }
        Ok(())
    }
}

impl From<Vec<Bone>> for Skeleton {
    fn from(bones: Vec<Bone>) -> Self {
        Self::new(bones)
    }
}
