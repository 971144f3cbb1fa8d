use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::Ray;

/// Flattened BVH node, as seen by the intersection kernel.
///
/// Children and face ranges are absolute indices into the scene-wide node
/// and face arrays.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GpuBvhNode {
    pub min: Vec3,
    pub begin: u32,
    pub max: Vec3,
    pub end: u32,
    pub left: u32,
    pub right: u32,
    _padding: [u32; 2],
}

impl GpuBvhNode {
    /// Marker stored in `left` and `right` of leaf nodes.
    pub const NO_CHILD: u32 = u32::MAX;

    pub fn leaf(min: Vec3, max: Vec3, begin: u32, end: u32) -> Self {
        Self {
            min,
            begin,
            max,
            end,
            left: Self::NO_CHILD,
            right: Self::NO_CHILD,
            _padding: Default::default(),
        }
    }

    pub fn internal(
        min: Vec3,
        max: Vec3,
        begin: u32,
        end: u32,
        left: u32,
        right: u32,
    ) -> Self {
        Self {
            min,
            begin,
            max,
            end,
            left,
            right,
            _padding: Default::default(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.left == Self::NO_CHILD
    }

    pub fn distance(&self, ray: &Ray) -> f32 {
        ray.distance_to_box(self.min, self.max)
    }
}
