use glam::Vec2;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Nodes at or below this weight are left out of [`BlendTree::active_clips`].
pub const ACTIVE_WEIGHT_EPSILON: f32 = 0.001;

const INLINE_ACTIVE_CLIPS: usize = 4;

pub type ActiveClips = SmallVec<[(String, f32); INLINE_ACTIVE_CLIPS]>;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlendNode {
    pub clip_name: String,
    pub position: Vec2,
    /// Derived from the blend parameter; any value supplied here is overwritten on recomputation.
    #[serde(skip)]
    weight: f32,
}

impl BlendNode {
    pub fn new(clip_name: impl Into<String>, position: Vec2) -> Self {
        Self { clip_name: clip_name.into(), position, weight: 0.0 }
    }

    pub fn weight(&self) -> f32 {
        self.weight
    }
}

/// 2D blend space weighting clips by their distance to a live parameter.
#[derive(Clone, Debug, Default)]
pub struct BlendTree {
    nodes: Vec<BlendNode>,
    blend_parameter: Vec2,
}

impl BlendTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: BlendNode) {
        self.nodes.push(node);
        self.calculate_weights();
    }

    pub fn nodes(&self) -> &[BlendNode] {
        &self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    pub fn blend_parameter(&self) -> Vec2 {
        self.blend_parameter
    }

    pub fn set_blend_parameter(&mut self, x: f32, y: f32) {
        self.blend_parameter = Vec2::new(x, y);
        self.calculate_weights();
    }

    /// `(clip, weight)` for every node above [`ACTIVE_WEIGHT_EPSILON`], in registration order.
    pub fn active_clips(&self) -> ActiveClips {
        self.nodes
            .iter()
            .filter(|node| node.weight > ACTIVE_WEIGHT_EPSILON)
            .map(|node| (node.clip_name.clone(), node.weight))
            .collect()
    }

    // Each node contributes max(0, 1 - distance); contributions are normalized to sum to one. A zero
    // total leaves every weight at zero.
    fn calculate_weights(&mut self) {
        let mut total = 0.0_f32;
        for node in &mut self.nodes {
            let distance = self.blend_parameter.distance(node.position);
            node.weight = (1.0 - distance).max(0.0);
            total += node.weight;
        }
        if total > 0.0 && total.is_finite() {
            for node in &mut self.nodes {
                node.weight /= total;
            }
        } else {
            for node in &mut self.nodes {
                node.weight = 0.0;
            }
        }
    }
}
