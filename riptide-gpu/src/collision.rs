use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

use crate::Ray;

/// Result of the most recent intersection test of a ray.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct CollisionInfo {
    pub position: Vec3,
    pub distance: f32,
    pub normal: Vec3,
    flags: u32,
    pub barycentrics: Vec2,
    pub primitive: u32,
    pub bucket: u32,

    /// Index into the lights table; meaningful only if [`Self::is_light()`].
    pub light: u32,

    _padding: [u32; 3],
}

impl CollisionInfo {
    const FLAG_HIT: u32 = 1;
    const FLAG_FLIPPED: u32 = 1 << 1;
    const FLAG_LIGHT: u32 = 1 << 2;

    pub fn none() -> Self {
        Self {
            position: Vec3::ZERO,
            distance: f32::MAX,
            normal: Vec3::ZERO,
            flags: 0,
            barycentrics: Vec2::ZERO,
            primitive: u32::MAX,
            bucket: Ray::MISS,
            light: u32::MAX,
            _padding: Default::default(),
        }
    }

    pub fn is_hit(&self) -> bool {
        self.flags & Self::FLAG_HIT != 0
    }

    /// Whether the interpolated normal had to be flipped to face the ray.
    pub fn is_flipped(&self) -> bool {
        self.flags & Self::FLAG_FLIPPED != 0
    }

    pub fn is_light(&self) -> bool {
        self.flags & Self::FLAG_LIGHT != 0
    }

    pub fn mark_hit(&mut self) {
        self.flags |= Self::FLAG_HIT;
    }

    pub fn mark_flipped(&mut self) {
        self.flags |= Self::FLAG_FLIPPED;
    }

    pub fn mark_light(&mut self, light: u32) {
        self.flags |= Self::FLAG_LIGHT;
        self.light = light;
    }
}

impl Default for CollisionInfo {
    fn default() -> Self {
        Self::none()
    }
}
